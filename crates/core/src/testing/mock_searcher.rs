//! Mock reverse image search backend for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::searcher::{ImageUpload, ReverseImageSearch, SearchError, TraceMoeResponse};

/// What a recorded search was issued with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    /// Upload of `len` bytes.
    Bytes {
        len: usize,
        mime_type: String,
        file_name: Option<String>,
    },
    /// Search by image URL.
    Url(String),
}

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub input: SearchInput,
    /// When the search was made.
    pub timestamp: Instant,
}

/// Mock implementation of the ReverseImageSearch trait.
///
/// Provides controllable behavior for testing:
/// - Return a configurable response, or queued per-call responses
/// - Track searches for assertions
/// - Simulate failures and latency
///
/// # Example
///
/// ```rust,ignore
/// use tracemoe_core::testing::{MockSearchBackend, fixtures};
///
/// let searcher = MockSearchBackend::new();
/// searcher
///     .set_response(fixtures::trace_moe_response(vec![
///         fixtures::search_match(21, 0.95),
///     ]))
///     .await;
///
/// let response = searcher.search_by_url("https://example.com/a.jpg").await?;
/// assert_eq!(response.result.len(), 1);
/// assert_eq!(searcher.search_count().await, 1);
/// ```
pub struct MockSearchBackend {
    /// Response returned when no queued response is pending.
    response: Arc<RwLock<TraceMoeResponse>>,
    /// Responses consumed one per search, ahead of `response`.
    queued: Arc<RwLock<VecDeque<TraceMoeResponse>>>,
    /// Recorded searches.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
    /// Simulated latency per search.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockSearchBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearchBackend {
    /// Create a mock that answers every search with an empty result list.
    pub fn new() -> Self {
        Self {
            response: Arc::new(RwLock::new(TraceMoeResponse::default())),
            queued: Arc::new(RwLock::new(VecDeque::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the response returned by every search.
    pub async fn set_response(&self, response: TraceMoeResponse) {
        *self.response.write().await = response;
    }

    /// Queue a response for a single upcoming search.
    pub async fn queue_response(&self, response: TraceMoeResponse) {
        self.queued.write().await.push_back(response);
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Delay every search by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get all recorded searches.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// URLs searched so far, in order.
    pub async fn url_searches(&self) -> Vec<String> {
        self.searches
            .read()
            .await
            .iter()
            .filter_map(|s| match &s.input {
                SearchInput::Url(url) => Some(url.clone()),
                SearchInput::Bytes { .. } => None,
            })
            .collect()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    async fn respond(&self, input: SearchInput) -> Result<TraceMoeResponse, SearchError> {
        self.searches.write().await.push(RecordedSearch {
            input,
            timestamp: Instant::now(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        if let Some(response) = self.queued.write().await.pop_front() {
            return Ok(response);
        }
        Ok(self.response.read().await.clone())
    }
}

#[async_trait]
impl ReverseImageSearch for MockSearchBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_by_bytes(&self, image: ImageUpload) -> Result<TraceMoeResponse, SearchError> {
        if image.is_empty() {
            return Err(SearchError::UnreadableInput("image is empty".to_string()));
        }
        self.respond(SearchInput::Bytes {
            len: image.bytes.len(),
            mime_type: image.mime_type,
            file_name: image.file_name,
        })
        .await
    }

    async fn search_by_url(&self, url: &str) -> Result<TraceMoeResponse, SearchError> {
        if url.trim().is_empty() {
            return Err(SearchError::UnreadableInput("image url is empty".to_string()));
        }
        self.respond(SearchInput::Url(url.to_string())).await
    }
}
