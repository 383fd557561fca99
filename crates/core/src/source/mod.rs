//! Image sources for upload searches.
//!
//! An `ImageSource` yields the bytes and content type of an image picked by
//! the user. Reading happens inside the search session, so a source that
//! cannot be read fails that session instead of the caller.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::searcher::ImageUpload;

/// The image behind a file trigger could not be read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot read {source_name}: {reason}")]
pub struct UnreadableInputError {
    pub source_name: String,
    pub reason: String,
}

impl UnreadableInputError {
    pub fn new(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Something that can produce image bytes on demand.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Human-readable label (file name, upload name).
    fn describe(&self) -> String;

    /// Read the full image.
    async fn read(&self) -> Result<ImageUpload, UnreadableInputError>;
}

/// An image on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> Result<ImageUpload, UnreadableInputError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| UnreadableInputError::new(self.describe(), e.to_string()))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Read image file");

        let mut upload = ImageUpload::new(bytes, mime_type_for_path(&self.path));
        if let Some(name) = self.path.file_name().and_then(|n| n.to_str()) {
            upload = upload.with_file_name(name);
        }
        Ok(upload)
    }
}

/// An image already held in memory, e.g. from an HTTP upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    upload: ImageUpload,
}

impl UploadedImage {
    pub fn new(upload: ImageUpload) -> Self {
        Self { upload }
    }
}

#[async_trait]
impl ImageSource for UploadedImage {
    fn describe(&self) -> String {
        self.upload
            .file_name
            .clone()
            .unwrap_or_else(|| "uploaded image".to_string())
    }

    async fn read(&self) -> Result<ImageUpload, UnreadableInputError> {
        Ok(self.upload.clone())
    }
}

/// Guess an image content type from the file extension.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("avif") => "image/avif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}
