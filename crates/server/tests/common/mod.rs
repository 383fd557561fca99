//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock backends injected, so the HTTP surface can be exercised
//! without reaching trace.moe or AniList.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tracemoe_core::{
    testing::{MockSearchBackend, MockTitleFetcher},
    Config, SearchOrchestrator, ServerConfig, TitleResolver,
};

/// Re-export fixtures for test convenience
pub use tracemoe_core::testing::fixtures;

const BOUNDARY: &str = "tracemoe-test-boundary";

/// Test fixture for API testing with mock dependencies.
///
/// Provides an in-process router with fully controllable mocks for:
/// - Reverse image search (MockSearchBackend)
/// - Title lookups (MockTitleFetcher)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_url_search() {
///     let fixture = TestFixture::new();
///
///     let response = fixture
///         .post("/api/v1/search/url?wait=true", json!({ "url": "https://x/y.jpg" }))
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock search backend - configure matches and failures
    pub searcher: Arc<MockSearchBackend>,
    /// Mock title fetcher - configure titles and failures
    pub titles: Arc<MockTitleFetcher>,
    /// The orchestrator behind the router
    pub orchestrator: Arc<SearchOrchestrator>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        let searcher = Arc::new(MockSearchBackend::new());
        let titles = Arc::new(MockTitleFetcher::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            ..Default::default()
        };

        let orchestrator = Arc::new(SearchOrchestrator::new(
            Arc::clone(&searcher) as Arc<dyn tracemoe_core::ReverseImageSearch>,
            TitleResolver::new(Arc::clone(&titles) as Arc<dyn tracemoe_core::TitleFetcher>),
            config.messages.clone(),
        ));

        let state = Arc::new(tracemoe_server::state::AppState::new(
            config,
            Arc::clone(&orchestrator),
        ));
        let router = tracemoe_server::api::create_router(state);

        Self {
            router,
            searcher,
            titles,
            orchestrator,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Send a multipart/form-data POST with a single file field.
    pub async fn post_file(
        &self,
        path: &str,
        field: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        self.send(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}
