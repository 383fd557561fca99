//! Types for title resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::CanonicalId;

/// Errors that can occur while fetching a single title.
///
/// These never escape [`super::TitleResolver`]; they are logged and replaced
/// with a placeholder.
#[derive(Debug, Error)]
pub enum TitleFetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// GraphQL-level errors, or no media for the id.
    #[error("media {0} not found")]
    NotFound(CanonicalId),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Title variants of an anime as reported by the metadata backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaTitle {
    #[serde(default)]
    pub romaji: Option<String>,
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub native: Option<String>,
}

impl MediaTitle {
    /// Native-script title if present and non-blank, else romaji.
    pub fn preferred(&self) -> Option<&str> {
        non_blank(self.native.as_deref()).or_else(|| non_blank(self.romaji.as_deref()))
    }

    /// Display string for `id`, falling back to the placeholder.
    pub fn display_title(&self, id: CanonicalId) -> String {
        self.preferred()
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_title(id))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Placeholder shown when no title could be obtained for `id`.
pub fn placeholder_title(id: CanonicalId) -> String {
    format!("ID: {} (title lookup failed)", id)
}

/// Trait for metadata backends that can look up a title by id.
#[async_trait]
pub trait TitleFetcher: Send + Sync {
    /// Fetch the titles of a single anime.
    async fn fetch_title(&self, id: CanonicalId) -> Result<MediaTitle, TitleFetchError>;
}
