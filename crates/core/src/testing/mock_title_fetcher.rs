//! Mock title fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::identifier::CanonicalId;
use crate::titles::{MediaTitle, TitleFetchError, TitleFetcher};

/// Mock implementation of the TitleFetcher trait.
///
/// Ids without a configured title fail with [`TitleFetchError::NotFound`].
/// Tracks every fetch and the peak number of concurrent fetches.
#[derive(Debug)]
pub struct MockTitleFetcher {
    /// Titles by AniList id.
    titles: Arc<RwLock<HashMap<i64, MediaTitle>>>,
    /// Injected failures, consumed by the first fetch of the id.
    failures: Arc<RwLock<HashMap<i64, TitleFetchError>>>,
    /// Recorded fetches.
    fetched: Arc<RwLock<Vec<CanonicalId>>>,
    /// Simulated latency per fetch.
    delay: Arc<RwLock<Option<Duration>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockTitleFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTitleFetcher {
    /// Create a mock that knows no titles.
    pub fn new() -> Self {
        Self {
            titles: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            fetched: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Add a title for `id`.
    pub async fn add_title(&self, id: i64, romaji: Option<&str>, native: Option<&str>) {
        self.titles.write().await.insert(
            id,
            MediaTitle {
                romaji: romaji.map(str::to_string),
                english: None,
                native: native.map(str::to_string),
            },
        );
    }

    /// Make the next fetch of `id` fail with `error`.
    pub async fn fail_id(&self, id: i64, error: TitleFetchError) {
        self.failures.write().await.insert(id, error);
    }

    /// Delay every fetch by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Ids fetched so far, in call order.
    pub async fn fetched_ids(&self) -> Vec<CanonicalId> {
        self.fetched.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetched.read().await.len()
    }

    /// Peak number of fetches that were in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TitleFetcher for MockTitleFetcher {
    async fn fetch_title(&self, id: CanonicalId) -> Result<MediaTitle, TitleFetchError> {
        self.fetched.write().await.push(id);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.failures.write().await.remove(&id.value()) {
            return Err(err);
        }

        self.titles
            .read()
            .await
            .get(&id.value())
            .cloned()
            .ok_or(TitleFetchError::NotFound(id))
    }
}
