//! Original-document link resolution
//!
//! Three candidate sources are tried in order, each verified with a live
//! probe before it is trusted:
//!
//! 1. the provider's `/pdf` endpoint next to the source URL
//! 2. the first download-looking anchor on the page
//! 3. a URL constructed from the publication number
//!
//! The page-dependent inputs are gathered into [`LinkCandidates`] up front so
//! the parsed document never lives across a probe.

use crate::config::ExtractorConfig;
use crate::document::{element_text, PageDocument};
use patentlens_domain::PublicationNumber;
use patentlens_fetch::Prober;
use reqwest::Url;
use tracing::{debug, info};

/// Which fallback produced the accepted link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// The provider's `/pdf` endpoint
    Endpoint,
    /// A download anchor found on the page
    Anchor,
    /// A URL built from the publication number
    Constructed,
}

/// A verified original-document URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// The accepted URL
    pub url: String,
    /// The strategy that produced it
    pub strategy: LinkStrategy,
}

/// Inputs for link resolution, collected from a parsed page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkCandidates {
    /// URL the page was fetched from
    pub source_url: String,
    /// Absolute href of the first download anchor, if any
    pub anchor_href: Option<String>,
    /// Normalized publication number, if one was found
    pub publication_number: Option<PublicationNumber>,
}

impl LinkCandidates {
    /// Gather candidates from a page and its extracted publication number
    pub fn collect(doc: &PageDocument, publication_number: &str, config: &ExtractorConfig) -> Self {
        Self {
            source_url: doc.url().to_string(),
            anchor_href: find_download_anchor(doc, &config.link_origin),
            publication_number: PublicationNumber::find(publication_number)
                .or_else(|| PublicationNumber::find(doc.url())),
        }
    }
}

/// First anchor that looks like a document download, made absolute
///
/// The href must contain `/pdf` or `download`, or end with `.pdf`; the anchor
/// text must mention `download` or `pdf`.
pub fn find_download_anchor(doc: &PageDocument, origin: &str) -> Option<String> {
    let href = doc.select("a[href]").into_iter().find_map(|anchor| {
        let href = anchor.value().attr("href")?.trim();
        let text = element_text(anchor).to_lowercase();
        let href_matches = href.contains("/pdf") || href.contains("download") || href.ends_with(".pdf");
        let text_matches = text.contains("download") || text.contains("pdf");
        (href_matches && text_matches).then(|| href.to_string())
    })?;

    if href.starts_with("http") {
        return Some(href);
    }
    match Url::parse(origin).and_then(|base| base.join(&href)) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            debug!(href = %href, error = %e, "Could not resolve anchor href");
            None
        }
    }
}

/// Resolves a verified original-document URL through a [`Prober`]
pub struct DocumentLinkResolver<P> {
    prober: P,
    config: ExtractorConfig,
}

impl<P: Prober> DocumentLinkResolver<P> {
    /// Create a resolver
    pub fn new(prober: P, config: ExtractorConfig) -> Self {
        Self { prober, config }
    }

    /// The `/pdf` endpoint next to a source URL
    pub fn endpoint_url(source_url: &str) -> String {
        match Url::parse(source_url) {
            Ok(mut url) => {
                url.set_query(None);
                url.set_fragment(None);
                format!("{}/pdf", url.as_str().trim_end_matches('/'))
            }
            Err(_) => format!("{}/pdf", source_url.trim_end_matches('/')),
        }
    }

    /// Whether a URL points at the document host with the document extension
    pub fn matches_document_pattern(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let host_matches = parsed
            .host_str()
            .map(|host| host.contains(&self.config.document_host))
            .unwrap_or(false);
        host_matches && parsed.path().ends_with(&self.config.document_extension)
    }

    /// Probe `url` and return the final URL when it matches the document pattern
    async fn probe_redirect(&self, url: &str) -> Option<String> {
        match self.prober.probe(url).await {
            Ok(outcome) if self.matches_document_pattern(&outcome.final_url) => {
                Some(outcome.final_url)
            }
            Ok(outcome) => {
                debug!(url, final_url = %outcome.final_url, "Probe target does not look like a document");
                None
            }
            Err(e) => {
                debug!(url, error = %e, "Probe failed");
                None
            }
        }
    }

    /// Run the fallback chain; `None` when no candidate verifies
    pub async fn resolve(&self, candidates: &LinkCandidates) -> Option<ResolvedLink> {
        if !candidates.source_url.is_empty() {
            let endpoint = Self::endpoint_url(&candidates.source_url);
            if let Some(url) = self.probe_redirect(&endpoint).await {
                info!(url = %url, "Document link resolved from endpoint");
                return Some(ResolvedLink {
                    url,
                    strategy: LinkStrategy::Endpoint,
                });
            }
        }

        if let Some(href) = &candidates.anchor_href {
            if let Some(url) = self.probe_redirect(href).await {
                info!(url = %url, "Document link resolved from page anchor");
                return Some(ResolvedLink {
                    url,
                    strategy: LinkStrategy::Anchor,
                });
            }
        }

        if let Some(number) = &candidates.publication_number {
            let constructed = self.config.constructed_url(&number.document_stem());
            match self.prober.probe(&constructed).await {
                Ok(_) => {
                    info!(url = %constructed, "Document link resolved from publication number");
                    return Some(ResolvedLink {
                        url: constructed,
                        strategy: LinkStrategy::Constructed,
                    });
                }
                Err(e) => debug!(url = %constructed, error = %e, "Constructed link did not verify"),
            }
        }

        debug!("No document link verified");
        None
    }
}
