//! Patentlens Fetch Layer
//!
//! Pluggable document fetchers and existence probes.
//!
//! # Architecture
//!
//! Every network interaction in Patentlens goes through one of two traits:
//!
//! - [`DocumentFetcher`]: retrieve a document (HTML page, PDF, image)
//! - [`Prober`]: lightweight existence check that follows redirects and
//!   reports the final URL
//!
//! # Implementations
//!
//! - `HttpFetcher`: direct HTTP with browser-like headers (both traits)
//! - `RenderingFetcher`: asks a realtime rendering service for the rendered
//!   HTML of a page, used when a direct fetch hits a bot challenge
//! - `ChallengeFallback`: composes the two
//! - `MockFetcher`: deterministic responses for testing (both traits)
//!
//! # Examples
//!
//! ```
//! use patentlens_fetch::{DocumentFetcher, MockFetcher};
//!
//! # async fn example() -> Result<(), patentlens_fetch::FetchError> {
//! let fetcher = MockFetcher::new();
//! fetcher.add_html("https://patents.google.com/patent/US1A", "<html></html>");
//!
//! let document = fetcher.fetch("https://patents.google.com/patent/US1A").await?;
//! assert!(document.is_html());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod challenge;
pub mod http;
pub mod rendering;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use challenge::{looks_like_bot_challenge, ChallengeFallback};
pub use http::{FetchSettings, HttpFetcher};
pub use rendering::{RenderingFetcher, RenderingSettings};

/// Errors that can occur while fetching or probing
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network or connection failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request exceeded its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status}: {reason}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Reason phrase or response excerpt
        reason: String,
    },

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network access disabled for this fetcher
    #[error("Network access disabled")]
    Disabled,
}

impl FetchError {
    /// Upstream status code, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
                reason: e.to_string(),
            }
        } else if e.is_decode() {
            FetchError::InvalidResponse(e.to_string())
        } else {
            FetchError::Communication(e.to_string())
        }
    }
}

/// Body chunks of a fetched document
pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// A successfully fetched document
///
/// The body is a stream so binary content can be passed through without
/// buffering; HTML is collected with [`FetchedDocument::text`].
pub struct FetchedDocument {
    /// URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Content type, `application/octet-stream` when the upstream sent none
    pub content_type: String,
    /// Content disposition header, if any
    pub content_disposition: Option<String>,
    /// Response body
    pub body: ByteStream,
}

impl FetchedDocument {
    /// Build a document from an in-memory body
    pub fn from_bytes(
        final_url: impl Into<String>,
        status: u16,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        let body: Bytes = body.into();
        Self {
            final_url: final_url.into(),
            status,
            content_type: content_type.into(),
            content_disposition: None,
            body: stream::once(async move { Ok(body) }).boxed(),
        }
    }

    /// Whether the content type announces HTML
    pub fn is_html(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("text/html")
    }

    /// Whether the content type announces a PDF
    pub fn is_pdf(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("application/pdf")
    }

    /// Collect the whole body
    pub async fn bytes(self) -> Result<Bytes, FetchError> {
        let chunks: Vec<Bytes> = self.body.try_collect().await?;
        Ok(chunks.concat().into())
    }

    /// Collect the whole body as text, replacing invalid UTF-8
    pub async fn text(self) -> Result<String, FetchError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Debug for FetchedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedDocument")
            .field("final_url", &self.final_url)
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("content_disposition", &self.content_disposition)
            .finish_non_exhaustive()
    }
}

/// Result of a successful existence probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// URL after following redirects
    pub final_url: String,
    /// HTTP status code of the final response
    pub status: u16,
}

/// Retrieves documents
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch `url`, following redirects
    ///
    /// A non-success upstream status is reported as [`FetchError::Status`].
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}

/// Verifies that a candidate URL exists
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `url`, following redirects
    ///
    /// Returns `Ok` only when the final response has a success status.
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, FetchError>;
}

#[async_trait]
impl<T: DocumentFetcher + ?Sized> DocumentFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        (**self).fetch(url).await
    }
}

#[async_trait]
impl<T: Prober + ?Sized> Prober for Arc<T> {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, FetchError> {
        (**self).probe(url).await
    }
}

/// Prober that never touches the network; every probe fails
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProber;

#[async_trait]
impl Prober for DisabledProber {
    async fn probe(&self, _url: &str) -> Result<ProbeOutcome, FetchError> {
        Err(FetchError::Disabled)
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Document {
        content_type: String,
        body: Bytes,
    },
    Redirect(String),
    Status(u16),
    Error,
}

/// Mock fetcher for deterministic testing
///
/// Serves pre-configured responses without making network calls and records
/// every URL it was asked for. Unregistered URLs answer HTTP 404.
///
/// # Examples
///
/// ```
/// use patentlens_fetch::{MockFetcher, Prober};
///
/// # async fn example() {
/// let mock = MockFetcher::new();
/// mock.add_redirect("https://a.test/pdf", "https://files.test/a.pdf");
/// mock.add_document("https://files.test/a.pdf", "application/pdf", b"%PDF".to_vec());
///
/// let outcome = mock.probe("https://a.test/pdf").await.unwrap();
/// assert_eq!(outcome.final_url, "https://files.test/a.pdf");
/// assert_eq!(mock.call_count(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a document at `url`
    pub fn add_document(
        &self,
        url: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) {
        self.insert(
            url,
            MockResponse::Document {
                content_type: content_type.into(),
                body: body.into(),
            },
        );
    }

    /// Serve an HTML page at `url`
    pub fn add_html(&self, url: impl Into<String>, html: impl Into<String>) {
        self.add_document(url, "text/html; charset=utf-8", html.into());
    }

    /// Redirect `url` to `target`
    pub fn add_redirect(&self, url: impl Into<String>, target: impl Into<String>) {
        self.insert(url, MockResponse::Redirect(target.into()));
    }

    /// Answer `url` with a non-success status
    pub fn add_status(&self, url: impl Into<String>, status: u16) {
        self.insert(url, MockResponse::Status(status));
    }

    /// Fail `url` with a communication error
    pub fn add_error(&self, url: impl Into<String>) {
        self.insert(url, MockResponse::Error);
    }

    /// URLs requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of fetches and probes so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn insert(&self, url: impl Into<String>, response: MockResponse) {
        self.responses.lock().unwrap().insert(url.into(), response);
    }

    /// Follow redirects to the terminal response
    fn resolve(&self, url: &str) -> (String, Option<MockResponse>) {
        self.calls.lock().unwrap().push(url.to_string());
        let responses = self.responses.lock().unwrap();
        let mut current = url.to_string();
        // bounded to survive redirect loops
        for _ in 0..10 {
            match responses.get(&current) {
                Some(MockResponse::Redirect(target)) => current = target.clone(),
                other => return (current, other.cloned()),
            }
        }
        (current, Some(MockResponse::Error))
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        match self.resolve(url) {
            (final_url, Some(MockResponse::Document { content_type, body })) => {
                Ok(FetchedDocument::from_bytes(final_url, 200, content_type, body))
            }
            (_, Some(MockResponse::Status(status))) => Err(FetchError::Status {
                status,
                reason: "mock status".to_string(),
            }),
            (_, Some(MockResponse::Error)) => {
                Err(FetchError::Communication("mock error".to_string()))
            }
            (_, _) => Err(FetchError::Status {
                status: 404,
                reason: "not registered".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Prober for MockFetcher {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, FetchError> {
        match self.resolve(url) {
            (final_url, Some(MockResponse::Document { .. })) => Ok(ProbeOutcome {
                final_url,
                status: 200,
            }),
            (_, Some(MockResponse::Status(status))) => Err(FetchError::Status {
                status,
                reason: "mock status".to_string(),
            }),
            (_, Some(MockResponse::Error)) => {
                Err(FetchError::Communication("mock error".to_string()))
            }
            (_, _) => Err(FetchError::Status {
                status: 404,
                reason: "not registered".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_html() {
        let mock = MockFetcher::new();
        mock.add_html("https://x.test/", "<p>hi</p>");

        let document = mock.fetch("https://x.test/").await.unwrap();
        assert!(document.is_html());
        assert!(!document.is_pdf());
        assert_eq!(document.text().await.unwrap(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_mock_unregistered_is_404() {
        let mock = MockFetcher::new();
        let err = mock.fetch("https://missing.test/").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_mock_probe_follows_redirects() {
        let mock = MockFetcher::new();
        mock.add_redirect("https://a.test/1", "https://a.test/2");
        mock.add_redirect("https://a.test/2", "https://b.test/doc.pdf");
        mock.add_document("https://b.test/doc.pdf", "application/pdf", Bytes::from_static(b"%PDF"));

        let outcome = mock.probe("https://a.test/1").await.unwrap();
        assert_eq!(outcome.final_url, "https://b.test/doc.pdf");
        assert_eq!(outcome.status, 200);
    }

    #[tokio::test]
    async fn test_mock_redirect_loop_fails() {
        let mock = MockFetcher::new();
        mock.add_redirect("https://a.test/x", "https://a.test/y");
        mock.add_redirect("https://a.test/y", "https://a.test/x");

        assert!(mock.probe("https://a.test/x").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockFetcher::new();
        mock.add_error("https://down.test/");
        mock.add_status("https://gone.test/", 410);

        assert!(matches!(
            mock.fetch("https://down.test/").await,
            Err(FetchError::Communication(_))
        ));
        assert_eq!(mock.probe("https://gone.test/").await.unwrap_err().status(), Some(410));
        assert_eq!(mock.calls(), vec!["https://down.test/", "https://gone.test/"]);
    }

    #[tokio::test]
    async fn test_mock_clone_shares_state() {
        let mock = MockFetcher::new();
        let clone = mock.clone();
        clone.add_html("https://shared.test/", "");

        assert!(mock.fetch("https://shared.test/").await.is_ok());
        assert_eq!(clone.call_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_prober() {
        let result = DisabledProber.probe("https://anything.test/").await;
        assert!(matches!(result, Err(FetchError::Disabled)));
    }

    #[tokio::test]
    async fn test_document_bytes_concatenates_chunks() {
        let chunks = vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];
        let document = FetchedDocument {
            final_url: "https://x.test/".to_string(),
            status: 200,
            content_type: "application/pdf".to_string(),
            content_disposition: None,
            body: stream::iter(chunks).boxed(),
        };
        assert_eq!(document.bytes().await.unwrap(), Bytes::from_static(b"abcd"));
    }
}
