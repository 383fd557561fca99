//! AniList GraphQL client.
//!
//! AniList allows anonymous queries; no API key is needed. It rate limits
//! at around 90 requests per minute per IP, which a single search stays well
//! under.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnilistConfig;
use crate::identifier::CanonicalId;
use crate::metrics::BACKEND_REQUEST_DURATION;

use super::{MediaTitle, TitleFetchError, TitleFetcher};

const TITLE_QUERY: &str =
    "query ($id: Int) { Media(id: $id, type: ANIME) { title { romaji english native } } }";

/// AniList API client.
pub struct AnilistClient {
    client: Client,
    endpoint: String,
}

impl AnilistClient {
    /// Create a new AniList client.
    pub fn new(config: AnilistConfig) -> Result<Self, TitleFetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
        })
    }

    async fn query_title(&self, id: CanonicalId) -> Result<MediaTitle, TitleFetchError> {
        debug!(anilist_id = %id, "AniList title query");

        let body = GraphQlRequest {
            query: TITLE_QUERY,
            variables: TitleVariables { id: id.value() },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TitleFetchError::Timeout
                } else {
                    TitleFetchError::Http(e)
                }
            })?;

        let status = response.status();
        if status == 404 {
            return Err(TitleFetchError::NotFound(id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TitleFetchError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: GraphQlResponse = response.json().await.map_err(|e| {
            TitleFetchError::Parse(format!("Failed to parse title response: {}", e))
        })?;

        parsed.into_title(id)
    }
}

#[async_trait]
impl TitleFetcher for AnilistClient {
    async fn fetch_title(&self, id: CanonicalId) -> Result<MediaTitle, TitleFetchError> {
        let start = Instant::now();
        let result = self.query_title(id).await;
        BACKEND_REQUEST_DURATION
            .with_label_values(&["anilist"])
            .observe(start.elapsed().as_secs_f64());
        result
    }
}

// ============================================================================
// AniList wire types (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: &'static str,
    variables: TitleVariables,
}

#[derive(Debug, Serialize)]
struct TitleVariables {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<TitleData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct TitleData {
    #[serde(rename = "Media")]
    media: Option<MediaInfo>,
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    title: Option<MediaTitle>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    status: Option<u16>,
}

impl GraphQlResponse {
    fn into_title(self, id: CanonicalId) -> Result<MediaTitle, TitleFetchError> {
        if let Some(err) = self.errors.first() {
            if err.status == Some(404) {
                return Err(TitleFetchError::NotFound(id));
            }
            return Err(TitleFetchError::Api {
                status: err.status.unwrap_or(200),
                message: err.message.clone(),
            });
        }

        self.data
            .and_then(|d| d.media)
            .ok_or(TitleFetchError::NotFound(id))?
            .title
            .ok_or_else(|| TitleFetchError::Parse(format!("media {} has no title", id)))
    }
}
