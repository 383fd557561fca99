//! Search session API handlers.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tracemoe_core::{
    ImageUpload, SearchMatch, SearchSession, SearchTrigger, SessionMessages, SessionPhase,
    TriggerSummary, UploadedImage,
};

use crate::state::AppState;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// Largest accepted upload; trace.moe rejects images above 25 MiB.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchUrlRequest {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Block until the session reaches a terminal phase.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One match, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    /// Normalized AniList id, `None` when the backend's id was unusable.
    pub anilist_id: Option<i64>,
    pub title: String,
    pub filename: String,
    pub episode: Option<i64>,
    pub from: f64,
    pub to: f64,
    /// `MM:SS - MM:SS`
    pub interval: String,
    pub similarity: f64,
    pub similarity_percent: f64,
    pub video: String,
    pub image: String,
}

impl MatchView {
    fn new(session: &SearchSession, m: &SearchMatch, messages: &SessionMessages) -> Self {
        Self {
            anilist_id: m.identifier.canonical().map(|id| id.value()),
            title: session.display_title(m, messages).to_string(),
            filename: m.source_file.clone(),
            episode: m.episode,
            from: m.interval_start,
            to: m.interval_end,
            interval: m.interval_label(),
            similarity: m.similarity,
            similarity_percent: m.similarity_percent(),
            video: m.preview_video_url.clone(),
            image: m.preview_image_url.clone(),
        }
    }
}

/// Session snapshot as served over HTTP and WebSocket.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: u64,
    pub phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerSummary>,
    pub matches: Vec<MatchView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionView {
    pub fn new(session: &SearchSession, messages: &SessionMessages) -> Self {
        Self {
            id: session.id(),
            phase: session.phase(),
            trigger: session.trigger().cloned(),
            matches: session
                .matches()
                .iter()
                .map(|m| MatchView::new(session, m, messages))
                .collect(),
            error: session.error_message().map(str::to_string),
            frame_count: session.frame_count(),
            started_at: session.started_at(),
            finished_at: session.finished_at(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a multipart read failure to its HTTP status (413 past the body limit).
fn multipart_error(e: MultipartError) -> (StatusCode, Json<ErrorResponse>) {
    (
        e.status(),
        Json(ErrorResponse {
            error: format!("Failed to read upload: {}", e.body_text()),
        }),
    )
}

/// Start a session, optionally waiting for it to settle.
async fn start_session(
    state: &AppState,
    trigger: SearchTrigger,
    params: SearchParams,
) -> (StatusCode, Json<SessionView>) {
    let orchestrator = state.orchestrator();
    let id = orchestrator.submit(trigger);

    let session = if params.wait {
        orchestrator.wait_until_settled(id).await
    } else {
        orchestrator.current()
    };

    let status = if session.id() == id && session.is_terminal() {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    (
        status,
        Json(SessionView::new(&session, orchestrator.messages())),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/search/url
///
/// Search by a publicly reachable image URL.
pub async fn search_url(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
    Json(request): Json<SearchUrlRequest>,
) -> Result<(StatusCode, Json<SessionView>), impl IntoResponse> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(bad_request("url must not be empty"));
    }

    info!(url = %url, wait = params.wait, "URL search requested");
    Ok(start_session(&state, SearchTrigger::url(url), params).await)
}

/// POST /api/v1/search/file
///
/// Search by an uploaded image (multipart field `image`).
pub async fn search_file(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SessionView>), impl IntoResponse> {
    let mut upload: Option<ImageUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };
        if field.name() != Some(IMAGE_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(multipart_error(e)),
        };

        let mut image = ImageUpload::new(bytes.to_vec(), mime_type);
        if let Some(name) = file_name {
            image = image.with_file_name(name);
        }
        upload = Some(image);
    }

    let Some(upload) = upload else {
        return Err(bad_request(format!(
            "multipart field '{}' is required",
            IMAGE_FIELD
        )));
    };

    info!(
        bytes = upload.bytes.len(),
        mime_type = %upload.mime_type,
        wait = params.wait,
        "File search requested"
    );
    let trigger = SearchTrigger::file(UploadedImage::new(upload));
    Ok(start_session(&state, trigger, params).await)
}

/// GET /api/v1/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let orchestrator = state.orchestrator();
    Json(SessionView::new(
        &orchestrator.current(),
        orchestrator.messages(),
    ))
}

/// DELETE /api/v1/session
///
/// Discard the current session and return to idle.
pub async fn reset_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let orchestrator = state.orchestrator();
    let session = orchestrator.reset();
    Json(SessionView::new(&session, orchestrator.messages()))
}
