//! Direct HTTP fetcher
//!
//! Sends browser-like headers on every request so patent offices serve the
//! same markup a desktop browser would receive.

use crate::{ByteStream, DocumentFetcher, FetchError, FetchedDocument, ProbeOutcome, Prober};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for document fetches (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default timeout for existence probes (10 seconds)
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Default maximum number of redirects followed
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Desktop Chrome user agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

/// Referer sent with every request
pub const DEFAULT_REFERER: &str = "https://patents.google.com/";

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const PDF_ACCEPT: &str = "application/pdf,*/*;q=0.8";

/// Settings for [`HttpFetcher`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Timeout for document fetches
    pub timeout_secs: u64,
    /// Timeout for existence probes
    pub probe_timeout_secs: u64,
    /// User-Agent header
    pub user_agent: String,
    /// Referer header
    pub referer: String,
    /// Accept-Language header
    pub accept_language: String,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Fetcher and prober backed by `reqwest`
///
/// # Examples
///
/// ```no_run
/// use patentlens_fetch::{DocumentFetcher, FetchSettings, HttpFetcher};
///
/// # async fn example() -> Result<(), patentlens_fetch::FetchError> {
/// let fetcher = HttpFetcher::new(FetchSettings::default())?;
/// let page = fetcher.fetch("https://patents.google.com/patent/US8900904B2/en").await?;
/// println!("{}", page.content_type);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl HttpFetcher {
    /// Build a fetcher from settings
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] if a header value is invalid or
    /// the TLS backend cannot be initialized.
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, header_value(&settings.user_agent)?);
        headers.insert(header::REFERER, header_value(&settings.referer)?);
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header_value(&settings.accept_language)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .build()
            .map_err(|e| FetchError::Configuration(e.to_string()))?;

        Ok(Self { client, settings })
    }

    /// Settings this fetcher was built with
    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value)
        .map_err(|e| FetchError::Configuration(format!("invalid header value {:?}: {}", value, e)))
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Turn a non-success response into [`FetchError::Status`]
async fn reject(response: reqwest::Response) -> FetchError {
    let status = response.status();
    let reason = response
        .text()
        .await
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown error").to_string());
    FetchError::Status {
        status: status.as_u16(),
        reason,
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        debug!(url, "Fetching document");
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, HTML_ACCEPT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        let headers = response.headers();
        let content_type = header_string(headers, header::CONTENT_TYPE)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let content_disposition = header_string(headers, header::CONTENT_DISPOSITION);
        let final_url = response.url().to_string();
        let status = response.status().as_u16();

        let body: ByteStream = response.bytes_stream().map_err(FetchError::from).boxed();

        Ok(FetchedDocument {
            final_url,
            status,
            content_type,
            content_disposition,
            body,
        })
    }
}

#[async_trait]
impl Prober for HttpFetcher {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, FetchError> {
        debug!(url, "Probing document");
        let response = self
            .client
            .head(url)
            .header(header::ACCEPT, PDF_ACCEPT)
            .timeout(Duration::from_secs(self.settings.probe_timeout_secs))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                reason: "probe failed".to_string(),
            });
        }

        Ok(ProbeOutcome {
            final_url: response.url().to_string(),
            status: response.status().as_u16(),
        })
    }
}
