//! HTTP server for trace.moe scene search with AniList title enrichment.

pub mod api;
pub mod metrics;
pub mod state;
