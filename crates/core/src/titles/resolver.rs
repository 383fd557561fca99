//! Concurrent title resolution.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::identifier::CanonicalId;
use crate::metrics::TITLE_FETCHES;

use super::{placeholder_title, TitleFetcher};

/// Resolves canonical ids into display titles.
///
/// One fetch per distinct id, all in flight at once, joined only after every
/// fetch has settled. A failed fetch yields a placeholder for its id; it never
/// fails the batch.
#[derive(Clone)]
pub struct TitleResolver {
    fetcher: Arc<dyn TitleFetcher>,
}

impl TitleResolver {
    pub fn new(fetcher: Arc<dyn TitleFetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve every id in `ids`. The result has exactly one entry per id.
    pub async fn resolve_titles(&self, ids: &BTreeSet<CanonicalId>) -> HashMap<CanonicalId, String> {
        if ids.is_empty() {
            return HashMap::new();
        }

        debug!(count = ids.len(), "Resolving titles");

        let fetches: Vec<_> = ids
            .iter()
            .map(|&id| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    match fetcher.fetch_title(id).await {
                        Ok(title) => {
                            TITLE_FETCHES.with_label_values(&["ok"]).inc();
                            (id, title.display_title(id))
                        }
                        Err(e) => {
                            TITLE_FETCHES.with_label_values(&["failed"]).inc();
                            warn!(anilist_id = %id, error = %e, "Title fetch failed");
                            (id, placeholder_title(id))
                        }
                    }
                }
            })
            .collect();

        join_all(fetches).await.into_iter().collect()
    }
}
