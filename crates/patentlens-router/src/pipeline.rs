//! The proxy pipeline behind `/api/proxy`.
//!
//! route -> fetch -> extract (HTML patent pages) or pass through (anything
//! else). Routing errors surface before any upstream call is made.

use patentlens_domain::PatentEnvelope;
use patentlens_extractor::{
    ExtractorConfig, ExtractorError, PatentExtractor, RouteError, SourceKind, SourceRouter,
};
use patentlens_fetch::{DocumentFetcher, FetchError, FetchedDocument, Prober};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Pipeline error
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The identifier could not be routed
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The primary fetch failed
    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),
}

/// What a proxy request produced
#[derive(Debug)]
pub enum ProxyOutcome {
    /// An extracted patent page
    Patent(PatentEnvelope),
    /// A non-extractable document to stream back unchanged
    Stream(FetchedDocument),
}

/// Routes, fetches and extracts proxied documents
pub struct ProxyPipeline {
    router: SourceRouter,
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: PatentExtractor<Arc<dyn Prober>>,
}

impl ProxyPipeline {
    /// Create a pipeline from a fetcher, a prober and the extraction settings
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        prober: Arc<dyn Prober>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        Ok(Self {
            router: SourceRouter::new(config.clone()),
            fetcher,
            extractor: PatentExtractor::new(prober, config)?,
        })
    }

    /// Process one raw `url` parameter
    pub async fn process(&self, raw: &str) -> Result<ProxyOutcome, PipelineError> {
        let routed = self.router.route(raw)?;
        info!(
            requested = %routed.unwrapped,
            target = %routed.target_url,
            rewritten = routed.rewritten(),
            "Proxying document"
        );

        let document = self.fetcher.fetch(&routed.target_url).await?;

        let source = match routed.target {
            SourceKind::Provider(provider) if document.is_html() => provider,
            _ => {
                debug!(
                    content_type = %document.content_type,
                    "Passing document through without extraction"
                );
                return Ok(ProxyOutcome::Stream(document));
            }
        };
        let requested = match routed.requested {
            SourceKind::Provider(provider) => provider,
            SourceKind::Other => source,
        };

        let html = document.text().await?;
        let record = self.extractor.extract(&html, &routed.target_url, source).await;

        Ok(ProxyOutcome::Patent(PatentEnvelope::new(source, requested, record)))
    }
}
