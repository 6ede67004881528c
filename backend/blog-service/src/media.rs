/// Local storage for article title images
///
/// Files live under `<root>/article/YYYYMMDD/` and are referenced from the
/// database by their path relative to `root`.
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Suffixed names tried after the plain one is taken
const MAX_NAME_ATTEMPTS: usize = 8;

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy an uploaded file into the store and return its relative path.
    ///
    /// The target is claimed with `create_new`, so two uploads never share a
    /// stored file.
    pub async fn save_avatar(
        &self,
        original_name: &str,
        source: &Path,
        today: NaiveDate,
    ) -> Result<String> {
        let file_name = sanitize_file_name(original_name)?;
        let dir = format!("article/{}", today.format("%Y%m%d"));
        tokio::fs::create_dir_all(self.root.join(&dir)).await?;

        let mut candidate = file_name.clone();
        let mut attempt = 0;
        let (relative, mut target) = loop {
            let relative = format!("{}/{}", dir, candidate);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&relative))
                .await
            {
                Ok(file) => break (relative, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                    candidate = with_suffix(&file_name);
                }
                Err(e) => return Err(e.into()),
            }
        };

        let copied = async {
            let mut source = tokio::fs::File::open(source).await?;
            tokio::io::copy(&mut source, &mut target).await?;
            target.flush().await
        }
        .await;
        if let Err(e) = copied {
            drop(target);
            let _ = tokio::fs::remove_file(self.root.join(&relative)).await;
            return Err(e.into());
        }

        debug!(path = %relative, "Saved avatar");
        Ok(relative)
    }

    /// Delete a stored file. Missing files are not an error.
    pub async fn remove(&self, relative: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %relative, "Avatar already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Public URL of a stored file
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}{}", self.url_prefix, relative)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(AppError::Internal(format!(
                "refusing media path outside the store: {}",
                relative
            )));
        }
        Ok(self.root.join(path))
    }
}

/// Keep only the last path component of a client file name and restrict it
/// to characters that are safe on any filesystem
fn sanitize_file_name(original: &str) -> Result<String> {
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    let extension = Path::new(&cleaned)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(cleaned),
        _ => Err(AppError::Validation(format!(
            "avatar must be an image ({})",
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}

fn with_suffix(file_name: &str) -> String {
    let tag = Uuid::new_v4().simple().to_string();
    let tag = &tag[..8];
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, tag, ext),
        None => format!("{}_{}", file_name, tag),
    }
}
