//! Tag input parsing.
//!
//! Input containing a comma is split on commas, anything else on whitespace.
//! So `"rust, web dev"` yields `{rust, web dev}` while `"rust web"` yields
//! `{rust, web}`.

use crate::error::{AppError, Result};
use std::collections::BTreeSet;

pub const MAX_TAG_LEN: usize = 100;

/// Parse free-form tag input into a sorted, de-duplicated set
pub fn parse_tags(input: &str) -> BTreeSet<String> {
    let pieces: Vec<&str> = if input.contains(',') {
        input.split(',').collect()
    } else {
        input.split_whitespace().collect()
    };

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse and reject tags longer than [`MAX_TAG_LEN`] characters
pub fn parse_and_validate(input: &str) -> Result<BTreeSet<String>> {
    let tags = parse_tags(input);
    if let Some(tag) = tags.iter().find(|tag| tag.chars().count() > MAX_TAG_LEN) {
        return Err(AppError::Validation(format!(
            "tag '{}...' is longer than {} characters",
            tag.chars().take(20).collect::<String>(),
            MAX_TAG_LEN
        )));
    }
    Ok(tags)
}

/// Join a tag list back into form input
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}
