//! Types for search sessions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::SessionMessages;
use crate::identifier::CanonicalId;
use crate::searcher::{SearchError, SearchMatch};
use crate::source::{ImageSource, UnreadableInputError};

/// Monotonic session id. Doubles as the generation tag for in-flight work.
pub type SessionId = u64;

/// Errors that end a session in the `Failed` phase.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The picked image could not be read.
    #[error("cannot read input: {0}")]
    UnreadableInput(String),

    /// Transport failure reaching the search backend.
    #[error("network error: {0}")]
    Network(String),

    /// The search backend reported an error.
    #[error("{0}")]
    Backend(String),

    /// The search succeeded but matched nothing.
    #[error("no results found")]
    EmptyResults,
}

impl SessionError {
    /// Message shown to the user for this failure.
    pub fn user_message(&self, messages: &SessionMessages) -> String {
        match self {
            SessionError::UnreadableInput(_) => messages.cannot_read_file.clone(),
            SessionError::Network(m) | SessionError::Backend(m) => {
                if m.trim().is_empty() {
                    messages.unknown_error.clone()
                } else {
                    m.clone()
                }
            }
            SessionError::EmptyResults => messages.no_results.clone(),
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::UnreadableInput(_) => "unreadable_input",
            SessionError::Network(_) => "network",
            SessionError::Backend(_) => "backend",
            SessionError::EmptyResults => "empty_results",
        }
    }
}

impl From<SearchError> for SessionError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::UnreadableInput(m) => SessionError::UnreadableInput(m),
            SearchError::Network(m) => SessionError::Network(m),
            SearchError::Backend(m) => SessionError::Backend(m),
        }
    }
}

impl From<UnreadableInputError> for SessionError {
    fn from(e: UnreadableInputError) -> Self {
        SessionError::UnreadableInput(e.to_string())
    }
}

/// What the user asked to search for.
#[derive(Clone)]
pub enum SearchTrigger {
    /// An image to upload, read when the session starts.
    File(Arc<dyn ImageSource>),
    /// A publicly reachable image URL.
    Url(String),
}

impl SearchTrigger {
    pub fn file(source: impl ImageSource + 'static) -> Self {
        SearchTrigger::File(Arc::new(source))
    }

    pub fn url(url: impl Into<String>) -> Self {
        SearchTrigger::Url(url.into())
    }

    pub fn summary(&self) -> TriggerSummary {
        match self {
            SearchTrigger::File(source) => TriggerSummary::File {
                name: source.describe(),
            },
            SearchTrigger::Url(url) => TriggerSummary::Url { url: url.clone() },
        }
    }
}

impl fmt::Debug for SearchTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchTrigger::File(source) => f.debug_tuple("File").field(&source.describe()).finish(),
            SearchTrigger::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// Serializable description of a trigger.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerSummary {
    File { name: String },
    Url { url: String },
}

/// Phase of a search session.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    InFlight,
    Completed,
    Failed,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::InFlight => "in_flight",
            SessionPhase::Completed => "completed",
            SessionPhase::Failed => "failed",
        }
    }
}

/// Immutable snapshot of one search attempt.
///
/// A transition builds a new snapshot; published snapshots are shared as
/// `Arc<SearchSession>` and never change.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSession {
    id: SessionId,
    phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    trigger: Option<TriggerSummary>,
    matches: Vec<SearchMatch>,
    titles: HashMap<CanonicalId, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
}

impl SearchSession {
    /// A session with nothing searched.
    pub fn idle(id: SessionId) -> Self {
        Self {
            id,
            phase: SessionPhase::Idle,
            trigger: None,
            matches: Vec::new(),
            titles: HashMap::new(),
            error_message: None,
            frame_count: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// A session whose search has just been dispatched.
    pub fn in_flight(id: SessionId, trigger: TriggerSummary) -> Self {
        Self {
            phase: SessionPhase::InFlight,
            trigger: Some(trigger),
            started_at: Some(Utc::now()),
            ..Self::idle(id)
        }
    }

    /// Terminal success, keeping `matches` in backend order.
    pub(crate) fn completed(
        &self,
        frame_count: u64,
        matches: Vec<SearchMatch>,
        titles: HashMap<CanonicalId, String>,
    ) -> Self {
        debug_assert_eq!(self.phase, SessionPhase::InFlight);
        Self {
            phase: SessionPhase::Completed,
            matches,
            titles,
            frame_count: Some(frame_count),
            finished_at: Some(Utc::now()),
            ..self.clone()
        }
    }

    /// Terminal failure with a user-displayable message.
    pub(crate) fn failed(&self, message: String) -> Self {
        debug_assert_eq!(self.phase, SessionPhase::InFlight);
        Self {
            phase: SessionPhase::Failed,
            error_message: Some(message),
            finished_at: Some(Utc::now()),
            ..self.clone()
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn trigger(&self) -> Option<&TriggerSummary> {
        self.trigger.as_ref()
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn titles(&self) -> &HashMap<CanonicalId, String> {
        &self.titles
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Resolved title for a match, `None` if its identifier was unusable.
    pub fn title_for(&self, m: &SearchMatch) -> Option<&str> {
        m.identifier
            .canonical()
            .and_then(|id| self.titles.get(&id))
            .map(String::as_str)
    }

    /// Title to display for a match, with the configured fallback.
    pub fn display_title<'a>(&'a self, m: &SearchMatch, messages: &'a SessionMessages) -> &'a str {
        self.title_for(m)
            .unwrap_or(messages.title_unavailable.as_str())
    }
}
