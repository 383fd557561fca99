//! Types for the reverse image search client.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::identifier::AnimeId;

/// Errors returned by a reverse image search backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The image could not be read, or there was nothing to submit.
    #[error("cannot read input image: {0}")]
    UnreadableInput(String),

    /// The backend could not be reached or the transfer failed.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with an error of its own.
    #[error("{0}")]
    Backend(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Network(e.to_string())
    }
}

/// An image ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// Declared content type, e.g. `image/png`.
    pub mime_type: String,
    /// File name sent with the multipart part.
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Full response body of a trace.moe search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TraceMoeResponse {
    /// Number of frames the backend compared against.
    #[serde(default)]
    pub frame_count: u64,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
    /// Matches, already ranked by similarity.
    #[serde(default)]
    pub result: Vec<SearchMatch>,
}

/// One candidate scene returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchMatch {
    /// AniList id of the matched anime.
    #[serde(rename(deserialize = "anilist"), default)]
    pub identifier: AnimeId,
    /// Source video file name.
    #[serde(rename(deserialize = "filename"), default)]
    pub source_file: String,
    /// Episode number, when the backend could tell a single one.
    #[serde(default, deserialize_with = "lenient_episode")]
    pub episode: Option<i64>,
    /// Start of the matching interval, in seconds.
    #[serde(rename(deserialize = "from"))]
    pub interval_start: f64,
    /// End of the matching interval, in seconds.
    #[serde(rename(deserialize = "to"))]
    pub interval_end: f64,
    /// Similarity in [0, 1].
    pub similarity: f64,
    #[serde(rename(deserialize = "video"), default)]
    pub preview_video_url: String,
    #[serde(rename(deserialize = "image"), default)]
    pub preview_image_url: String,
}

impl SearchMatch {
    /// Similarity as a percentage.
    pub fn similarity_percent(&self) -> f64 {
        self.similarity * 100.0
    }

    /// Matching interval formatted as `MM:SS - MM:SS`.
    pub fn interval_label(&self) -> String {
        format!(
            "{} - {}",
            format_timestamp(self.interval_start),
            format_timestamp(self.interval_end)
        )
    }
}

/// Format seconds as `MM:SS`, rounding to the nearest second.
///
/// Minutes are not wrapped into hours.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// trace.moe reports `episode` as a number, `null`, or for multi-episode
/// files a string or array. Only a single number is kept.
fn lenient_episode<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        _ => None,
    }))
}

/// Trait for reverse image search backends.
#[async_trait]
pub trait ReverseImageSearch: Send + Sync {
    /// Backend name (for logging).
    fn name(&self) -> &str;

    /// Search by uploading raw image bytes.
    ///
    /// Empty input fails with [`SearchError::UnreadableInput`] without
    /// touching the network.
    async fn search_by_bytes(&self, image: ImageUpload) -> Result<TraceMoeResponse, SearchError>;

    /// Search by a publicly reachable image URL.
    async fn search_by_url(&self, url: &str) -> Result<TraceMoeResponse, SearchError>;
}
