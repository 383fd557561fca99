//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Search sessions (outcomes, duration, stale results)
//! - Title resolution (per-id fetch results)
//! - External services (trace.moe, AniList)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sessions
// =============================================================================

/// Search sessions finished, by outcome.
pub static SEARCH_SESSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tracemoe_search_sessions_total",
            "Total search sessions by terminal outcome",
        ),
        &["outcome"], // "completed", "unreadable_input", "network", "backend", "empty_results"
    )
    .unwrap()
});

/// Search session duration in seconds, trigger to terminal state.
pub static SEARCH_SESSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tracemoe_search_session_duration_seconds",
            "Duration of a search session from trigger to terminal state",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Terminal results dropped because a newer session had started.
pub static STALE_RESULTS_DISCARDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tracemoe_stale_results_discarded_total",
        "Session results discarded because a newer session was current",
    )
    .unwrap()
});

/// Matches returned per completed session.
pub static MATCHES_RETURNED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tracemoe_matches_returned",
            "Number of matches returned per completed session",
        )
        .buckets(vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Titles
// =============================================================================

/// Title fetches by result.
pub static TITLE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tracemoe_title_fetches_total", "Total per-id title fetches"),
        &["result"], // "ok", "failed"
    )
    .unwrap()
});

// =============================================================================
// External Services
// =============================================================================

/// Backend request duration in seconds.
pub static BACKEND_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tracemoe_backend_request_duration_seconds",
            "Duration of requests to external backends",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["backend"], // "trace_moe", "anilist"
    )
    .unwrap()
});

/// All core metrics, for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SEARCH_SESSIONS.clone()),
        Box::new(SEARCH_SESSION_DURATION.clone()),
        Box::new(STALE_RESULTS_DISCARDED.clone()),
        Box::new(MATCHES_RETURNED.clone()),
        Box::new(TITLE_FETCHES.clone()),
        Box::new(BACKEND_REQUEST_DURATION.clone()),
    ]
}
