//! Search session orchestration.
//!
//! The orchestrator drives one session at a time through the state machine:
//! - **Search**: one call to the reverse image search backend
//! - **Enrichment**: concurrent title resolution for the distinct anime ids
//! - **Publication**: immutable snapshots handed out through a watch channel,
//!   with results of superseded sessions dropped

mod orchestrator;
mod types;

pub use orchestrator::{SearchOrchestrator, SessionUpdateCallback};
pub use types::*;
