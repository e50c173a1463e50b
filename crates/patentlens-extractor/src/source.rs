//! Source routing
//!
//! Turns an inbound identifier into a fetchable URL: proxy wrappers are
//! unwrapped, the provider is classified, and Provider B URLs are rewritten
//! to Provider A's canonical patent URL.

use crate::config::ExtractorConfig;
use crate::error::RouteError;
use once_cell::sync::Lazy;
use patentlens_domain::{Provider, PublicationNumber};
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;
use tracing::{debug, info};

/// Marker of a URL wrapped in another proxy request
const PROXY_WRAPPER: &str = "/api/proxy?url=";

const GOOGLE_PATENT_PATH: &str = "patents.google.com/patent";
const ESPACENET_PATENT_PATH: &str = "worldwide.espacenet.com/patent";

static WRAPPED_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url=([^&]+)").expect("wrapped url pattern is valid"));

/// Provider classification of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A known patent provider
    Provider(Provider),
    /// Anything else (document files, images, other sites)
    Other,
}

/// The routing decision for one inbound identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedRequest {
    /// Identifier after unwrapping and percent-decoding
    pub unwrapped: String,
    /// Classification of the unwrapped identifier
    pub requested: SourceKind,
    /// URL to fetch
    pub target_url: String,
    /// Classification of the target URL
    pub target: SourceKind,
    /// Publication number used for a rewrite, if any
    pub publication_number: Option<PublicationNumber>,
}

impl RoutedRequest {
    /// Whether the identifier was rewritten to another provider
    pub fn rewritten(&self) -> bool {
        self.requested != self.target
    }

    /// Whether the target should go through patent extraction
    pub fn is_extractable(&self) -> bool {
        matches!(self.target, SourceKind::Provider(_))
    }
}

/// Classify a URL by provider
pub fn classify(url: &str) -> SourceKind {
    if url.contains(GOOGLE_PATENT_PATH) {
        SourceKind::Provider(Provider::GooglePatents)
    } else if url.contains(ESPACENET_PATENT_PATH) {
        SourceKind::Provider(Provider::Espacenet)
    } else {
        SourceKind::Other
    }
}

/// Unwraps, classifies and rewrites inbound identifiers
#[derive(Debug, Clone)]
pub struct SourceRouter {
    config: ExtractorConfig,
}

impl SourceRouter {
    /// Create a router
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Percent-decode until no proxy wrapper remains
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidIdentifier`] when more than `max_unwrap_depth`
    /// wrappers are nested.
    pub fn unwrap(&self, raw: &str) -> Result<String, RouteError> {
        let mut current = raw.trim().to_string();

        for depth in 0..=self.config.max_unwrap_depth {
            let decoded = percent_decode_str(&current).decode_utf8_lossy().into_owned();
            if !decoded.contains(PROXY_WRAPPER) {
                return Ok(decoded);
            }
            if depth == self.config.max_unwrap_depth {
                break;
            }
            let Some(inner) = WRAPPED_URL
                .captures(&decoded)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
            else {
                return Err(RouteError::InvalidIdentifier(format!(
                    "empty proxy wrapper in {}",
                    decoded
                )));
            };
            debug!(depth, inner = %inner, "Unwrapped proxied identifier");
            current = inner;
        }

        Err(RouteError::InvalidIdentifier(format!(
            "more than {} nested proxy wrappers",
            self.config.max_unwrap_depth
        )))
    }

    /// Rewrite a Provider B URL to the Provider A canonical URL
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidIdentifier`] when no publication number is embedded.
    pub fn rewrite(&self, url: &str) -> Result<(String, PublicationNumber), RouteError> {
        let number = PublicationNumber::find(url).ok_or_else(|| {
            RouteError::InvalidIdentifier(format!("no publication number in {}", url))
        })?;
        Ok((self.config.patent_url(number.as_str()), number))
    }

    /// Full routing decision for an inbound identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use patentlens_extractor::{ExtractorConfig, SourceRouter};
    ///
    /// let router = SourceRouter::new(ExtractorConfig::default());
    /// let routed = router
    ///     .route("https://worldwide.espacenet.com/patent/search/family/042199146/publication/US8900904B2?q=US8900904B2")
    ///     .unwrap();
    /// assert_eq!(routed.target_url, "https://patents.google.com/patent/US8900904B2");
    /// assert!(routed.rewritten());
    /// ```
    pub fn route(&self, raw: &str) -> Result<RoutedRequest, RouteError> {
        if raw.trim().is_empty() {
            return Err(RouteError::InvalidIdentifier("empty identifier".to_string()));
        }
        let unwrapped = self.unwrap(raw)?;

        if let Some(number) = PublicationNumber::parse_exact(&unwrapped) {
            let target_url = self.config.patent_url(number.as_str());
            info!(number = %number, target = %target_url, "Routing bare publication number");
            let kind = SourceKind::Provider(Provider::GooglePatents);
            return Ok(RoutedRequest {
                unwrapped,
                requested: kind,
                target_url,
                target: kind,
                publication_number: Some(number),
            });
        }

        let parsed = Url::parse(&unwrapped)
            .map_err(|e| RouteError::InvalidIdentifier(format!("{}: {}", unwrapped, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RouteError::InvalidIdentifier(format!(
                "unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let requested = classify(&unwrapped);
        let routed = match requested {
            SourceKind::Provider(Provider::Espacenet) => {
                let (target_url, number) = self.rewrite(&unwrapped)?;
                info!(from = %unwrapped, to = %target_url, "Rewrote Espacenet identifier");
                RoutedRequest {
                    target: classify(&target_url),
                    unwrapped,
                    requested,
                    target_url,
                    publication_number: Some(number),
                }
            }
            _ => RoutedRequest {
                target_url: unwrapped.clone(),
                publication_number: PublicationNumber::find(&unwrapped),
                unwrapped,
                requested,
                target: requested,
            },
        };
        Ok(routed)
    }
}
