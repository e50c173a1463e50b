//! Bot-challenge detection and fallback

use crate::{DocumentFetcher, FetchError, FetchedDocument};
use async_trait::async_trait;
use tracing::{info, warn};

/// Lower-case markers found on interstitial bot-challenge pages
const CHALLENGE_MARKERS: &[&str] = &[
    "<title>just a moment",
    "cf-chl-",
    "challenge-platform",
    "attention required! | cloudflare",
    "checking your browser before accessing",
];

/// Whether an HTML body looks like a bot challenge rather than content
///
/// # Examples
///
/// ```
/// use patentlens_fetch::looks_like_bot_challenge;
///
/// assert!(looks_like_bot_challenge("<html><title>Just a moment...</title></html>"));
/// assert!(!looks_like_bot_challenge("<html><title>US8900904B2</title></html>"));
/// ```
pub fn looks_like_bot_challenge(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    CHALLENGE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Fetcher that retries challenged HTML pages through a fallback fetcher
///
/// Non-HTML documents from the primary fetcher are passed through untouched.
/// HTML bodies are buffered so they can be inspected.
pub struct ChallengeFallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> ChallengeFallback<P, F>
where
    P: DocumentFetcher,
    F: DocumentFetcher,
{
    /// Compose a primary fetcher with a fallback
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P, F> DocumentFetcher for ChallengeFallback<P, F>
where
    P: DocumentFetcher,
    F: DocumentFetcher,
{
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let document = match self.primary.fetch(url).await {
            Ok(document) => document,
            // challenges are commonly served with 403 or 503
            Err(e @ FetchError::Status { status: 403 | 503, .. }) => {
                warn!(url, error = %e, "Primary fetch refused, using fallback");
                return self.fallback.fetch(url).await;
            }
            Err(e) => return Err(e),
        };

        if !document.is_html() {
            return Ok(document);
        }

        let final_url = document.final_url.clone();
        let status = document.status;
        let content_type = document.content_type.clone();
        let html = document.text().await?;

        if looks_like_bot_challenge(&html) {
            info!(url, "Bot challenge detected, using fallback");
            return self.fallback.fetch(url).await;
        }

        Ok(FetchedDocument::from_bytes(final_url, status, content_type, html))
    }
}
