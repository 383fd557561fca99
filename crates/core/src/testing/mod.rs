//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the backend traits, so the
//! orchestrator and the server can be tested without reaching trace.moe or
//! AniList.
//!
//! # Example
//!
//! ```rust,ignore
//! use tracemoe_core::testing::{fixtures, MockSearchBackend, MockTitleFetcher};
//!
//! let searcher = MockSearchBackend::new();
//! let titles = MockTitleFetcher::new();
//!
//! // Configure mock responses
//! searcher.set_response(fixtures::trace_moe_response(vec![
//!     fixtures::search_match(21, 0.95),
//! ])).await;
//! titles.add_title(21, Some("One Piece"), Some("ONE PIECE")).await;
//!
//! // Use in SearchOrchestrator...
//! ```

mod mock_searcher;
mod mock_title_fetcher;

pub use mock_searcher::{MockSearchBackend, RecordedSearch, SearchInput};
pub use mock_title_fetcher::MockTitleFetcher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::Value;

    use crate::identifier::{AnimeId, CanonicalId};
    use crate::searcher::{SearchMatch, TraceMoeResponse};

    /// Create a search match for AniList id `id` with reasonable defaults.
    pub fn search_match(id: i64, similarity: f64) -> SearchMatch {
        SearchMatch {
            identifier: AnimeId::Numeric(CanonicalId(id)),
            source_file: format!("[Group] Show {} - 01 [1080p].mkv", id),
            episode: Some(1),
            interval_start: 63.5,
            interval_end: 65.25,
            similarity,
            preview_video_url: format!("https://media.trace.moe/video/{}/clip.mp4", id),
            preview_image_url: format!("https://media.trace.moe/image/{}/frame.jpg", id),
        }
    }

    /// Create a search match whose identifier is decoded from raw JSON.
    pub fn search_match_raw(raw: Value, similarity: f64) -> SearchMatch {
        SearchMatch {
            identifier: AnimeId::from(&raw),
            ..search_match(0, similarity)
        }
    }

    /// Wrap matches in a successful backend response.
    pub fn trace_moe_response(matches: Vec<SearchMatch>) -> TraceMoeResponse {
        TraceMoeResponse {
            frame_count: 1_000_000,
            error: String::new(),
            result: matches,
        }
    }
}
