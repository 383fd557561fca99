//! Reverse image search.
//!
//! This module provides a `ReverseImageSearch` trait for submitting an image
//! (raw bytes or a URL) to a scene search backend, with a trace.moe
//! implementation.

mod trace_moe;
mod types;

pub use trace_moe::TraceMoeClient;
pub use types::*;
