//! trace.moe and AniList client tests against local fake backends.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    extract::{Multipart, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use tracemoe_core::{
    AnilistClient, AnilistConfig, AnimeId, CanonicalId, ImageUpload, ReverseImageSearch,
    SearchError, TitleFetchError, TitleFetcher, TraceMoeClient, TraceMoeConfig,
};

/// Serve `app` on an ephemeral local port.
async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn trace_moe(addr: SocketAddr, cut_borders: bool) -> TraceMoeClient {
    TraceMoeClient::new(TraceMoeConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 5,
        cut_borders,
    })
    .unwrap()
}

fn anilist(addr: SocketAddr) -> AnilistClient {
    AnilistClient::new(AnilistConfig {
        endpoint: format!("http://{}/", addr),
        timeout_secs: 5,
    })
    .unwrap()
}

fn match_json(anilist: Value, filename: &str) -> Value {
    json!({
        "anilist": anilist,
        "filename": filename,
        "episode": 12,
        "from": 663.17,
        "to": 665.42,
        "similarity": 0.9440424588727485,
        "video": "https://media.trace.moe/video/21/clip.mp4",
        "image": "https://media.trace.moe/image/21/frame.jpg"
    })
}

async fn search_by_url(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let url = params.get("url").cloned().unwrap_or_default();
    Json(json!({
        "frameCount": 745506,
        "error": "",
        "result": [
            match_json(json!(12345.0), &url),
            match_json(json!(12345), "second.mkv"),
            match_json(json!("abc"), "third.mkv"),
        ]
    }))
}

async fn search_by_upload(
    Query(params): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut described = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            described = Some(format!("{}|{}|{}", file_name, content_type, bytes));
        }
    }

    let Some(described) = described else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid image" })),
        );
    };
    let cut = if params.contains_key("cutBorders") { "cut" } else { "plain" };

    (
        StatusCode::OK,
        Json(json!({
            "frameCount": 10,
            "error": "",
            "result": [match_json(json!(21), &format!("{}|{}", described, cut))]
        })),
    )
}

fn trace_moe_app() -> Router {
    Router::new().route("/search", get(search_by_url).post(search_by_upload))
}

#[tokio::test]
async fn test_url_search_decodes_matches() {
    let addr = spawn(trace_moe_app()).await;
    let client = trace_moe(addr, false);

    let response = client
        .search_by_url("https://example.com/frame.jpg")
        .await
        .unwrap();

    assert_eq!(response.frame_count, 745506);
    assert_eq!(response.result.len(), 3);
    let first = &response.result[0];
    assert_eq!(first.source_file, "https://example.com/frame.jpg");
    assert_eq!(first.identifier, AnimeId::Numeric(CanonicalId(12345)));
    assert_eq!(first.episode, Some(12));
    assert_eq!(first.interval_label(), "11:03 - 11:05");
    assert_eq!(response.result[1].identifier, response.result[0].identifier);
    assert_eq!(response.result[2].identifier, AnimeId::Unparseable);
}

#[tokio::test]
async fn test_upload_search_sends_multipart_image() {
    let addr = spawn(trace_moe_app()).await;
    let client = trace_moe(addr, true);

    let upload = ImageUpload::new(vec![7; 64], "image/png").with_file_name("shot.png");
    let response = client.search_by_bytes(upload).await.unwrap();

    assert_eq!(response.result.len(), 1);
    assert_eq!(response.result[0].source_file, "shot.png|image/png|64|cut");
}

#[tokio::test]
async fn test_backend_error_field_is_reported() {
    let app = Router::new().route(
        "/search",
        get(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "Search queue is full" })),
            )
        }),
    );
    let addr = spawn(app).await;

    let err = trace_moe(addr, false).search_by_url("u").await.unwrap_err();

    assert_eq!(err, SearchError::Backend("Search queue is full".into()));
}

#[tokio::test]
async fn test_non_json_error_status() {
    let app = Router::new().route(
        "/search",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let addr = spawn(app).await;

    let err = trace_moe(addr, false).search_by_url("u").await.unwrap_err();

    match err {
        SearchError::Backend(message) => assert!(message.contains("502")),
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Bind then drop, so nothing listens on the port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = trace_moe(addr, false).search_by_url("u").await.unwrap_err();

    assert!(matches!(err, SearchError::Network(_)));
}

async fn graphql(Json(body): Json<Value>) -> impl IntoResponse {
    match body["variables"]["id"].as_i64() {
        Some(21) => (
            StatusCode::OK,
            Json(json!({
                "data": { "Media": { "title": {
                    "romaji": "One Piece",
                    "english": "One Piece",
                    "native": "ONE PIECE"
                } } }
            })),
        ),
        Some(500) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "errors": [{ "message": "Internal Server Error" }] })),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "errors": [{ "message": "Not Found.", "status": 404 }],
                "data": { "Media": null }
            })),
        ),
    }
}

#[tokio::test]
async fn test_anilist_title_lookup() {
    let addr = spawn(Router::new().route("/", post(graphql))).await;
    let client = anilist(addr);

    let title = client.fetch_title(CanonicalId(21)).await.unwrap();

    assert_eq!(title.native.as_deref(), Some("ONE PIECE"));
    assert_eq!(title.display_title(CanonicalId(21)), "ONE PIECE");
}

#[tokio::test]
async fn test_anilist_not_found() {
    let addr = spawn(Router::new().route("/", post(graphql))).await;

    let err = anilist(addr).fetch_title(CanonicalId(999)).await.unwrap_err();

    assert!(matches!(err, TitleFetchError::NotFound(CanonicalId(999))));
}

#[tokio::test]
async fn test_anilist_server_error() {
    let addr = spawn(Router::new().route("/", post(graphql))).await;

    let err = anilist(addr).fetch_title(CanonicalId(500)).await.unwrap_err();

    assert!(matches!(err, TitleFetchError::Api { status: 500, .. }));
}
