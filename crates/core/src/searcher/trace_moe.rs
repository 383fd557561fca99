//! trace.moe search backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use tracing::debug;

use crate::config::TraceMoeConfig;
use crate::metrics::BACKEND_REQUEST_DURATION;

use super::{ImageUpload, ReverseImageSearch, SearchError, TraceMoeResponse};

/// Name of the multipart part carrying the image.
const IMAGE_PART: &str = "image";

/// File name used when the upload does not carry one.
const DEFAULT_FILE_NAME: &str = "image.jpg";

/// trace.moe API client.
pub struct TraceMoeClient {
    client: Client,
    base_url: String,
    cut_borders: bool,
}

impl TraceMoeClient {
    /// Create a new trace.moe client.
    pub fn new(config: TraceMoeConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cut_borders: config.cut_borders,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn flags(&self) -> Vec<(&'static str, &'static str)> {
        if self.cut_borders {
            vec![("cutBorders", "")]
        } else {
            Vec::new()
        }
    }

    /// Turn an HTTP response into a search result.
    ///
    /// trace.moe reports problems in the `error` field, often alongside a
    /// non-2xx status, so the body is inspected before the status.
    async fn read_response(response: Response) -> Result<TraceMoeResponse, SearchError> {
        let status = response.status();
        let body = response.text().await?;

        let parsed = serde_json::from_str::<TraceMoeResponse>(&body);

        if let Ok(ref r) = parsed {
            if !r.error.trim().is_empty() {
                return Err(SearchError::Backend(r.error.clone()));
            }
        }

        if !status.is_success() {
            return Err(SearchError::Backend(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        parsed.map_err(|e| SearchError::Backend(format!("malformed response: {}", e)))
    }

    fn map_send_error(e: reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Network("request timed out".to_string())
        } else {
            SearchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ReverseImageSearch for TraceMoeClient {
    fn name(&self) -> &str {
        "trace.moe"
    }

    async fn search_by_bytes(&self, image: ImageUpload) -> Result<TraceMoeResponse, SearchError> {
        if image.is_empty() {
            return Err(SearchError::UnreadableInput("image is empty".to_string()));
        }

        debug!(
            bytes = image.bytes.len(),
            mime_type = %image.mime_type,
            "trace.moe upload search"
        );

        let file_name = image
            .file_name
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        let part = multipart::Part::bytes(image.bytes)
            .file_name(file_name)
            .mime_str(&image.mime_type)
            .map_err(|e| {
                SearchError::UnreadableInput(format!(
                    "invalid content type '{}': {}",
                    image.mime_type, e
                ))
            })?;
        let form = multipart::Form::new().part(IMAGE_PART, part);

        let start = Instant::now();
        let response = self
            .client
            .post(self.search_url())
            .query(&self.flags())
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let result = Self::read_response(response).await;

        BACKEND_REQUEST_DURATION
            .with_label_values(&["trace_moe"])
            .observe(start.elapsed().as_secs_f64());
        result
    }

    async fn search_by_url(&self, url: &str) -> Result<TraceMoeResponse, SearchError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SearchError::UnreadableInput("image url is blank".to_string()));
        }

        debug!(image_url = %url, "trace.moe url search");

        let start = Instant::now();
        let response = self
            .client
            .get(self.search_url())
            .query(&[("url", url)])
            .query(&self.flags())
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let result = Self::read_response(response).await;

        BACKEND_REQUEST_DURATION
            .with_label_values(&["trace_moe"])
            .observe(start.elapsed().as_secs_f64());
        result
    }
}
