//! Search orchestrator implementation.
//!
//! Drives one search session at a time through
//! `Idle -> InFlight -> {Completed, Failed}`:
//! - Search: exactly one backend call, by bytes or by URL
//! - Enrichment: concurrent title lookups for the distinct ids (TitleResolver)
//! - Publication: terminal snapshots are published only while their session
//!   is still the current one

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::SessionMessages;
use crate::identifier::{distinct_ids, CanonicalId};
use crate::metrics::{
    MATCHES_RETURNED, SEARCH_SESSIONS, SEARCH_SESSION_DURATION, STALE_RESULTS_DISCARDED,
};
use crate::searcher::{ReverseImageSearch, TraceMoeResponse};
use crate::source::UnreadableInputError;
use crate::titles::TitleResolver;

use super::types::{SearchSession, SearchTrigger, SessionError, SessionId};

/// Callback invoked with every published session snapshot.
///
/// Callbacks run while publication is serialized, so they observe
/// transitions in order. They must not start or reset sessions themselves.
pub type SessionUpdateCallback = Arc<dyn Fn(&SearchSession) + Send + Sync>;

/// Single-writer slot holding the current session snapshot.
#[derive(Clone)]
struct SessionPublisher {
    tx: Arc<watch::Sender<Arc<SearchSession>>>,
    next_id: Arc<AtomicU64>,
    publish_lock: Arc<Mutex<()>>,
    callback: Option<SessionUpdateCallback>,
}

impl SessionPublisher {
    fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(SearchSession::idle(0)));
        Self {
            tx: Arc::new(tx),
            next_id: Arc::new(AtomicU64::new(1)),
            publish_lock: Arc::new(Mutex::new(())),
            callback: None,
        }
    }

    /// Allocate the next session id and make `build(id)` current.
    fn start(&self, build: impl FnOnce(SessionId) -> SearchSession) -> Arc<SearchSession> {
        let _guard = self.publish_lock.lock().unwrap_or_else(|e| e.into_inner());
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Arc::new(build(id));
        self.tx.send_replace(Arc::clone(&session));
        self.notify(&session);
        session
    }

    /// Publish `session` if it is still the current session.
    ///
    /// Returns `false` when a newer session has taken over.
    fn publish_if_current(&self, session: &Arc<SearchSession>) -> bool {
        let _guard = self.publish_lock.lock().unwrap_or_else(|e| e.into_inner());
        let published = self.tx.send_if_modified(|current| {
            if current.id() == session.id() {
                *current = Arc::clone(session);
                true
            } else {
                false
            }
        });
        if published {
            self.notify(session);
        }
        published
    }

    fn notify(&self, session: &SearchSession) {
        if let Some(callback) = &self.callback {
            callback(session);
        }
    }

    fn current(&self) -> Arc<SearchSession> {
        Arc::clone(&*self.tx.borrow())
    }
}

/// Everything a running session needs, detached from the orchestrator.
#[derive(Clone)]
struct SessionContext {
    searcher: Arc<dyn ReverseImageSearch>,
    resolver: TitleResolver,
    messages: Arc<SessionMessages>,
    publisher: SessionPublisher,
}

/// The search orchestrator - owns the current session and its lifecycle.
pub struct SearchOrchestrator {
    ctx: SessionContext,
    active_task: Mutex<Option<JoinHandle<()>>>,
}

impl SearchOrchestrator {
    /// Create a new orchestrator, starting Idle.
    pub fn new(
        searcher: Arc<dyn ReverseImageSearch>,
        resolver: TitleResolver,
        messages: SessionMessages,
    ) -> Self {
        Self {
            ctx: SessionContext {
                searcher,
                resolver,
                messages: Arc::new(messages),
                publisher: SessionPublisher::new(),
            },
            active_task: Mutex::new(None),
        }
    }

    /// Set a callback that receives every session transition.
    pub fn with_update_callback(mut self, callback: SessionUpdateCallback) -> Self {
        self.ctx.publisher.callback = Some(callback);
        self
    }

    /// Messages used for failed sessions.
    pub fn messages(&self) -> &SessionMessages {
        &self.ctx.messages
    }

    /// Current session snapshot.
    pub fn current(&self) -> Arc<SearchSession> {
        self.ctx.publisher.current()
    }

    /// Subscribe to session snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SearchSession>> {
        self.ctx.publisher.tx.subscribe()
    }

    /// Start a new session in the background and return its id.
    ///
    /// Any session still in flight becomes stale; its results are dropped.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, trigger: SearchTrigger) -> SessionId {
        let mut active = self.active_task.lock().unwrap_or_else(|e| e.into_inner());
        abort_task(active.take());

        let session = self.begin(&trigger);
        let id = session.id();
        let ctx = self.ctx.clone();
        *active = Some(tokio::spawn(async move {
            run_session(ctx, session, trigger).await;
        }));
        id
    }

    /// Run a new session to completion on the caller's task.
    ///
    /// Returns the terminal snapshot. If another session started meanwhile,
    /// the snapshot is returned but not published.
    pub async fn search(&self, trigger: SearchTrigger) -> Arc<SearchSession> {
        let session = {
            let mut active = self.active_task.lock().unwrap_or_else(|e| e.into_inner());
            abort_task(active.take());
            self.begin(&trigger)
        };
        run_session(self.ctx.clone(), session, trigger).await
    }

    /// Discard the current session and go back to Idle.
    pub fn reset(&self) -> Arc<SearchSession> {
        let mut active = self.active_task.lock().unwrap_or_else(|e| e.into_inner());
        abort_task(active.take());

        let session = self.ctx.publisher.start(SearchSession::idle);
        info!(session_id = session.id(), "Search session reset");
        session
    }

    /// Wait until session `id` reaches a terminal phase or is replaced.
    ///
    /// Returns the snapshot current at that point.
    pub async fn wait_until_settled(&self, id: SessionId) -> Arc<SearchSession> {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|s| s.id() != id || s.is_terminal()).await {
            Ok(session) => Arc::clone(&*session),
            Err(_) => self.current(),
        };
        settled
    }

    fn begin(&self, trigger: &SearchTrigger) -> Arc<SearchSession> {
        let summary = trigger.summary();
        let session = self
            .ctx
            .publisher
            .start(|id| SearchSession::in_flight(id, summary));
        info!(
            session_id = session.id(),
            trigger = ?trigger,
            "Search session started"
        );
        session
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        let active = self.active_task.get_mut().unwrap_or_else(|e| e.into_inner());
        abort_task(active.take());
    }
}

fn abort_task(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        if !task.is_finished() {
            debug!("Aborting superseded search task");
            task.abort();
        }
    }
}

/// Drive one InFlight session to its terminal snapshot and publish it.
async fn run_session(
    ctx: SessionContext,
    session: Arc<SearchSession>,
    trigger: SearchTrigger,
) -> Arc<SearchSession> {
    let start = Instant::now();

    let (next, outcome) = match execute(&ctx, trigger).await {
        Ok((response, titles)) => {
            MATCHES_RETURNED
                .with_label_values(&[])
                .observe(response.result.len() as f64);
            info!(
                session_id = session.id(),
                matches = response.result.len(),
                titles = titles.len(),
                "Search session completed"
            );
            (
                session.completed(response.frame_count, response.result, titles),
                "completed",
            )
        }
        Err(e) => {
            error!(
                session_id = session.id(),
                kind = e.kind(),
                error = %e,
                "Search session failed"
            );
            (session.failed(e.user_message(&ctx.messages)), e.kind())
        }
    };

    SEARCH_SESSIONS.with_label_values(&[outcome]).inc();
    SEARCH_SESSION_DURATION
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());

    let next = Arc::new(next);
    if !ctx.publisher.publish_if_current(&next) {
        STALE_RESULTS_DISCARDED.inc();
        debug!(
            session_id = next.id(),
            "Discarding result of superseded session"
        );
    }
    next
}

/// Search, then resolve titles for the distinct ids of the matches.
async fn execute(
    ctx: &SessionContext,
    trigger: SearchTrigger,
) -> Result<(TraceMoeResponse, HashMap<CanonicalId, String>), SessionError> {
    let response = match trigger {
        SearchTrigger::File(source) => {
            let upload = source.read().await?;
            if upload.is_empty() {
                return Err(UnreadableInputError::new(source.describe(), "image is empty").into());
            }
            debug!(
                backend = ctx.searcher.name(),
                bytes = upload.bytes.len(),
                "Searching by image"
            );
            ctx.searcher.search_by_bytes(upload).await?
        }
        SearchTrigger::Url(url) => {
            debug!(backend = ctx.searcher.name(), url = %url, "Searching by url");
            ctx.searcher.search_by_url(&url).await?
        }
    };

    if response.result.is_empty() {
        return Err(SessionError::EmptyResults);
    }

    let ids = distinct_ids(&response.result);
    let titles = ctx.resolver.resolve_titles(&ids).await;

    Ok((response, titles))
}
