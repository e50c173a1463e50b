//! Core PatentExtractor implementation

use crate::config::ExtractorConfig;
use crate::document::PageDocument;
use crate::document_link::{DocumentLinkResolver, LinkCandidates};
use crate::error::ExtractorError;
use crate::strategy::{resolve_field, resolve_list, ExtractionStrategy, Field};
use crate::timeline::{reconcile, SyntheticInputs, TimelineMode};
use patentlens_domain::{PatentDate, PatentRecord, Provider};
use patentlens_fetch::Prober;
use tracing::{debug, info};

/// Build a record from a parsed page, without the document link
///
/// Pure and deterministic: the same page always yields the same record.
pub fn extract_record(doc: &PageDocument, strategy: &ExtractionStrategy) -> PatentRecord {
    let field = |field: Field| resolve_field(doc, strategy.accessors(field)).unwrap_or_default();
    let date = |field: Field| {
        PatentDate::from_extracted(resolve_field(doc, strategy.accessors(field)).as_deref())
    };

    let tables = strategy.tables;
    let mut record = PatentRecord {
        publication_number: field(Field::PublicationNumber),
        application_number: field(Field::ApplicationNumber),
        title: field(Field::Title),
        abstract_text: field(Field::Abstract),
        inventors: resolve_list(doc, strategy.inventors),
        assignee: field(Field::Assignee),
        status: field(Field::Status),
        filing_date: date(Field::FilingDate),
        publication_date: date(Field::PublicationDate),
        priority_date: date(Field::PriorityDate),
        classifications: tables.classifications(doc),
        citations: tables.citations(doc),
        cited_by: tables.cited_by(doc),
        family: tables.family(doc),
        similar_documents: tables.similar_documents(doc),
        legal_events: tables.legal_events(doc),
        events: Vec::new(),
        drawings: resolve_list(doc, strategy.drawings),
        document_url: None,
        claims_html: field(Field::ClaimsHtml),
        description_html: field(Field::DescriptionHtml),
    };

    let raw_filing = resolve_field(doc, strategy.accessors(Field::FilingDate)).unwrap_or_default();
    let raw_publication =
        resolve_field(doc, strategy.accessors(Field::PublicationDate)).unwrap_or_default();
    let inputs = SyntheticInputs {
        filing_date: &raw_filing,
        publication_date: &raw_publication,
        assignee: &record.assignee,
        publication_number: &record.publication_number,
        legal_events: &record.legal_events,
        status: &record.status,
    };
    let (mode, events) = reconcile(doc, &inputs);
    if mode == TimelineMode::Synthetic {
        debug!("No timeline widget, events synthesized");
    }
    record.events = events;

    record
}

/// Extracts patent records and resolves their original-document links
///
/// # Examples
///
/// ```
/// use patentlens_domain::Provider;
/// use patentlens_extractor::{ExtractorConfig, PatentExtractor};
/// use patentlens_fetch::DisabledProber;
///
/// # async fn example() -> Result<(), patentlens_extractor::ExtractorError> {
/// let extractor = PatentExtractor::new(DisabledProber, ExtractorConfig::default())?;
/// let record = extractor
///     .extract(
///         "<h2 id=\"title\">Widget</h2>",
///         "https://patents.google.com/patent/US1234567B1/en",
///         Provider::GooglePatents,
///     )
///     .await;
/// assert_eq!(record.title, "Widget");
/// assert_eq!(record.document_url, None);
/// # Ok(())
/// # }
/// ```
pub struct PatentExtractor<P> {
    resolver: DocumentLinkResolver<P>,
    config: ExtractorConfig,
}

impl<P: Prober> PatentExtractor<P> {
    /// Create a new extractor
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Config`] if the configuration is invalid.
    pub fn new(prober: P, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            resolver: DocumentLinkResolver::new(prober, config.clone()),
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Parse a page and build its record plus the link-resolution inputs
    ///
    /// The parsed document is dropped before this returns.
    pub fn prepare(&self, html: &str, url: &str, provider: Provider) -> (PatentRecord, LinkCandidates) {
        let doc = PageDocument::parse(html, url);
        let record = extract_record(&doc, crate::strategy::strategy_for(provider));
        let candidates = LinkCandidates::collect(&doc, &record.publication_number, &self.config);
        (record, candidates)
    }

    /// Extract a complete record, including the verified document link
    pub async fn extract(&self, html: &str, url: &str, provider: Provider) -> PatentRecord {
        let (mut record, candidates) = self.prepare(html, url, provider);
        record.document_url = self.resolver.resolve(&candidates).await.map(|link| link.url);

        info!(
            publication_number = %record.publication_number,
            events = record.events.len(),
            document_url = record.document_url.is_some(),
            "Extracted patent record"
        );
        record
    }
}
