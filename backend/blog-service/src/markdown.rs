//! Markdown rendering for article bodies.
//!
//! Every heading gets a slug anchor so the table of contents can link to it.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashSet;

/// Table of contents entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub title: String,
}

/// Rendered article body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMarkdown {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Render markdown to HTML and collect the heading outline
pub fn render(markdown: &str) -> RenderedMarkdown {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut events: Vec<Event> = Parser::new_ext(markdown, options).collect();
    let mut toc = Vec::new();
    let mut used: HashSet<String> = HashSet::new();

    let mut open: Option<(usize, String)> = None;
    for index in 0..events.len() {
        let closes_heading = match &events[index] {
            Event::Start(Tag::Heading { .. }) => {
                open = Some((index, String::new()));
                false
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, title)) = open.as_mut() {
                    title.push_str(text);
                }
                false
            }
            Event::End(TagEnd::Heading(_)) => true,
            _ => false,
        };
        if !closes_heading {
            continue;
        }

        let Some((start, title)) = open.take() else {
            continue;
        };
        let id = unique_slug(&title, &mut used);
        if let Event::Start(Tag::Heading {
            level, id: anchor, ..
        }) = &mut events[start]
        {
            *anchor = Some(CowStr::from(id.clone()));
            toc.push(TocEntry {
                level: *level as u8,
                id,
                title: title.trim().to_string(),
            });
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());

    RenderedMarkdown { html: out, toc }
}

/// Lowercase, keep alphanumerics, collapse whitespace and hyphens to `-`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        }
    }

    slug
}

fn unique_slug(title: &str, used: &mut HashSet<String>) -> String {
    let mut base = slugify(title);
    if base.is_empty() {
        base = "section".to_string();
    }

    let mut candidate = base.clone();
    let mut suffix = 0;
    while used.contains(&candidate) {
        suffix += 1;
        candidate = format!("{}_{}", base, suffix);
    }
    used.insert(candidate.clone());
    candidate
}
