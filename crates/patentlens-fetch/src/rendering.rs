//! Rendering-service fetcher
//!
//! Some pages only reveal their content after JavaScript runs, and some sit
//! behind a bot challenge. This fetcher asks a realtime rendering API to load
//! the page in a headless browser and return the resulting HTML.

use crate::{DocumentFetcher, FetchError, FetchedDocument};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default rendering API endpoint
pub const DEFAULT_RENDERING_ENDPOINT: &str = "https://realtime.oxylabs.io/v1/queries";

/// Default number of attempts per page
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Settings for [`RenderingFetcher`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingSettings {
    /// Rendering API endpoint
    pub endpoint: String,
    /// API username
    pub username: String,
    /// API password
    pub password: String,
    /// Geographic location the page is loaded from
    pub geo_location: String,
    /// Client timeout for the whole rendering call
    pub timeout_secs: u64,
    /// How long the headless browser waits before capturing the page
    pub wait_for_ms: u64,
    /// Attempts before giving up
    pub max_retries: u32,
}

impl Default for RenderingSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RENDERING_ENDPOINT.to_string(),
            username: String::new(),
            password: String::new(),
            geo_location: "United States".to_string(),
            timeout_secs: 40,
            wait_for_ms: 15_000,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Serialize)]
struct ContextEntry {
    key: &'static str,
    value: serde_json::Value,
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    source: &'static str,
    url: &'a str,
    geo_location: &'a str,
    render: &'static str,
    context: Vec<ContextEntry>,
}

#[derive(Deserialize)]
struct RenderResponse {
    #[serde(default)]
    results: Vec<RenderResult>,
}

#[derive(Deserialize)]
struct RenderResult {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Fetcher that returns rendered HTML from a rendering service
#[derive(Debug, Clone)]
pub struct RenderingFetcher {
    client: reqwest::Client,
    settings: RenderingSettings,
}

impl RenderingFetcher {
    /// Build a fetcher from settings
    pub fn new(settings: RenderingSettings) -> Result<Self, FetchError> {
        if settings.endpoint.is_empty() {
            return Err(FetchError::Configuration(
                "rendering endpoint is empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| FetchError::Configuration(e.to_string()))?;
        Ok(Self { client, settings })
    }

    fn request<'a>(&'a self, url: &'a str) -> RenderRequest<'a> {
        // the service-side timeout stays below our client timeout
        let service_timeout_ms = self.settings.timeout_secs.saturating_sub(10).max(1) * 1000;
        RenderRequest {
            source: "universal",
            url,
            geo_location: &self.settings.geo_location,
            render: "html",
            context: vec![
                ContextEntry {
                    key: "follow_redirections",
                    value: serde_json::Value::Bool(true),
                },
                ContextEntry {
                    key: "wait_for",
                    value: self.settings.wait_for_ms.into(),
                },
                ContextEntry {
                    key: "timeout",
                    value: service_timeout_ms.into(),
                },
            ],
        }
    }

    async fn render_once(&self, url: &str) -> Result<(String, String), FetchError> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .json(&self.request(url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::Status { status, reason });
        }

        let parsed: RenderResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let result = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::InvalidResponse("no results".to_string()))?;
        let content = result
            .content
            .filter(|content| !content.is_empty())
            .ok_or_else(|| FetchError::InvalidResponse("no content".to_string()))?;

        Ok((result.url.unwrap_or_else(|| url.to_string()), content))
    }
}

#[async_trait]
impl DocumentFetcher for RenderingFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let max_retries = self.settings.max_retries.max(1);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < max_retries {
            debug!(url, attempt = attempts + 1, "Requesting rendered page");
            match self.render_once(url).await {
                Ok((final_url, content)) => {
                    return Ok(FetchedDocument::from_bytes(
                        final_url,
                        200,
                        "text/html; charset=utf-8",
                        content,
                    ));
                }
                // credentials problems do not improve with retries
                Err(e @ FetchError::Status { status: 401 | 403, .. }) => return Err(e),
                Err(e) => {
                    warn!(url, error = %e, "Rendering attempt failed");
                    last_error = Some(e);
                }
            }

            attempts += 1;
            if attempts < max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::Communication("Max retries exceeded".to_string())))
    }
}
