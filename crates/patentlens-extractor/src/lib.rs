//! Patentlens Extractor
//!
//! Turns patent pages into normalized [`PatentRecord`](patentlens_domain::PatentRecord)s.
//!
//! # Overview
//!
//! Patent offices publish the same bibliographic data under different markup,
//! and even one office changes its markup between page revisions. Every value
//! is therefore read through an ordered fallback chain, and anything that
//! cannot be found degrades to a not-found marker instead of an error.
//!
//! # Architecture
//!
//! ```text
//! identifier → SourceRouter → fetch → PageDocument
//!                                        ├── field chains (strategy)
//!                                        ├── row specs (tables)
//!                                        └── timeline reconciler
//!                                                 ↓
//!                         LinkCandidates → DocumentLinkResolver → PatentRecord
//! ```
//!
//! # Key Features
//!
//! - **Declarative strategies**: per-provider accessor tables, testable as data
//! - **Tabular relations**: citations, family, classifications, legal events
//! - **Timeline reconciliation**: widget or synthetic mode, status always last
//! - **Verified document links**: probe-checked fallback chain
//! - **Source routing**: proxy unwrapping and Espacenet-to-Google rewriting
//!
//! # Example Usage
//!
//! ```
//! use patentlens_domain::Provider;
//! use patentlens_extractor::{ExtractorConfig, PatentExtractor, SourceRouter};
//! use patentlens_fetch::MockFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let router = SourceRouter::new(ExtractorConfig::default());
//! let routed = router.route("US8900904B2")?;
//!
//! let prober = MockFetcher::new();
//! let extractor = PatentExtractor::new(prober, ExtractorConfig::default())?;
//!
//! let html = r#"<h2 id="title">Wireless widget</h2>"#;
//! let record = extractor.extract(html, &routed.target_url, Provider::GooglePatents).await;
//!
//! assert_eq!(record.title, "Wireless widget");
//! assert_eq!(record.publication_number, "US8900904B2");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod document;
mod document_link;
mod error;
mod extractor;
mod source;
mod strategy;
mod tables;
mod timeline;

#[cfg(test)]
mod tests;

pub use config::{ExtractorConfig, STEM_PLACEHOLDER};
pub use document::PageDocument;
pub use document_link::{
    find_download_anchor, DocumentLinkResolver, LinkCandidates, LinkStrategy, ResolvedLink,
};
pub use error::{ExtractorError, RouteError};
pub use extractor::{extract_record, PatentExtractor};
pub use source::{classify, RoutedRequest, SourceKind, SourceRouter};
pub use strategy::{
    resolve_field, resolve_list, strategy_for, Accessor, ExtractionStrategy, Field, ListSource,
    Source, Transform, ESPACENET, GOOGLE_PATENTS,
};
pub use tables::{extract_rows, Cell, ColumnSpec, Row, RowSpec, TableSet};
pub use timeline::{
    legal_event_title, post_process, reconcile, synthetic_events, widget_events, SyntheticInputs,
    TimelineMode,
};
