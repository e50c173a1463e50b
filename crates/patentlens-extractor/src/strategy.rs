//! Declarative extraction strategies
//!
//! Each provider gets an [`ExtractionStrategy`]: for every field an ordered
//! list of [`Accessor`]s, from structured micro-data down to free-text
//! heuristics. The tables are plain data; [`resolve_field`] and
//! [`resolve_list`] evaluate them against a [`PageDocument`].

use crate::document::{collapse_whitespace, element_text, selector, PageDocument};
use crate::tables::{TableSet, ESPACENET_TABLES, GOOGLE_TABLES};
use once_cell::sync::Lazy;
use patentlens_domain::Provider;
use regex::Regex;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, trace};

/// ISO calendar date anywhere in a string
pub const ISO_DATE: &str = r"\d{4}-\d{2}-\d{2}";

/// Publication-number-like tokens, used to normalize printed number lists
pub const NUMBER_TOKEN: &str = r"[A-Z]{2}[0-9A-Z]+";

/// Embedded publication number in a URL
pub const URL_PUBLICATION_NUMBER: &str = r"[A-Z]{2}\d+[A-Z]\d?";

/// Post-processing applied to a raw accessor value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Use the value as read
    None,
    /// First match of the pattern, else the raw value
    FirstMatch(&'static str),
    /// All matches joined with the separator, else the raw value
    AllMatches(&'static str, &'static str),
    /// Text before the first occurrence of the separator
    SplitFirst(&'static str),
}

impl Transform {
    /// Apply the transform to a raw value
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Transform::None => raw.to_string(),
            Transform::FirstMatch(pattern) => compile(*pattern)
                .and_then(|re| re.find(raw).map(|m| m.as_str().to_string()))
                .unwrap_or_else(|| raw.to_string()),
            Transform::AllMatches(pattern, joiner) => {
                let matches: Vec<String> = compile(*pattern)
                    .map(|re| re.find_iter(raw).map(|m| m.as_str().to_string()).collect())
                    .unwrap_or_default();
                if matches.is_empty() {
                    raw.to_string()
                } else {
                    matches.join(joiner)
                }
            }
            Transform::SplitFirst(separator) => raw
                .split(*separator)
                .next()
                .unwrap_or(raw)
                .trim()
                .to_string(),
        }
    }
}

/// Where an accessor reads its raw value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Text of the first matching element with non-empty text
    Text(&'static str),
    /// Attribute of the first matching element carrying it
    Attr(&'static str, &'static str),
    /// Inner markup of the first matching element, untouched
    InnerHtml(&'static str),
    /// Pattern matched against the document URL; capture group 1 if present
    UrlPattern(&'static str),
}

impl Source {
    /// Read the raw value, `None` when nothing usable matched
    pub fn read(&self, doc: &PageDocument) -> Option<String> {
        let value = match self {
            Source::Text(css) => doc
                .select(css)
                .into_iter()
                .map(element_text)
                .find(|text| !text.is_empty()),
            Source::Attr(css, attr) => doc
                .select(css)
                .into_iter()
                .find_map(|el| el.value().attr(attr))
                .map(collapse_whitespace),
            Source::InnerHtml(css) => doc
                .select(css)
                .into_iter()
                .map(|el| el.inner_html())
                .find(|html| !html.trim().is_empty()),
            Source::UrlPattern(pattern) => compile(*pattern).and_then(|re| {
                re.captures(doc.url()).map(|caps| {
                    caps.get(1)
                        .or_else(|| caps.get(0))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default()
                })
            }),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// One `(source, transform)` entry of a fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accessor {
    /// Where to read
    pub source: Source,
    /// How to post-process
    pub transform: Transform,
}

impl Accessor {
    /// Accessor without post-processing
    pub const fn new(source: Source) -> Self {
        Self {
            source,
            transform: Transform::None,
        }
    }

    /// Accessor with a transform
    pub const fn with(source: Source, transform: Transform) -> Self {
        Self { source, transform }
    }
}

/// Where a list accessor reads its values from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    /// Non-empty text of every matching element
    EachText(&'static str),
    /// Attribute of every matching element that carries it
    EachAttr(&'static str, &'static str),
    /// First present attribute of every matching element, kept only when
    /// absolute or root-relative, and resolved against `base`
    EachLink {
        /// Element selector
        css: &'static str,
        /// Attributes tried in order
        attrs: &'static [&'static str],
        /// Origin prepended to root-relative values
        base: &'static str,
    },
    /// Text of every `values` element whose preceding `label` sibling
    /// contains `label_text` (case-insensitive)
    Labeled {
        /// Value element selector
        values: &'static str,
        /// Label sibling selector
        label: &'static str,
        /// Lower-case text the label must contain
        label_text: &'static str,
    },
}

impl ListSource {
    /// Read every value, in document order
    pub fn read(&self, doc: &PageDocument) -> Vec<String> {
        match self {
            ListSource::EachText(css) => doc
                .select(css)
                .into_iter()
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect(),
            ListSource::EachAttr(css, attr) => doc
                .select(css)
                .into_iter()
                .filter_map(|el| el.value().attr(attr))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect(),
            ListSource::EachLink { css, attrs, base } => doc
                .select(css)
                .into_iter()
                .filter_map(|el| attrs.iter().find_map(|attr| el.value().attr(attr)))
                .map(str::trim)
                .filter_map(|value| {
                    if value.starts_with("http") {
                        Some(value.to_string())
                    } else if value.starts_with('/') {
                        Some(format!("{}{}", base, value))
                    } else {
                        None
                    }
                })
                .collect(),
            ListSource::Labeled {
                values,
                label,
                label_text,
            } => {
                let Some(label_selector) = selector(label) else {
                    return Vec::new();
                };
                doc.select(values)
                    .into_iter()
                    .filter(|el| {
                        el.prev_siblings()
                            .find_map(scraper::ElementRef::wrap)
                            .filter(|prev| label_selector.matches(prev))
                            .map(|prev| element_text(prev).to_lowercase().contains(*label_text))
                            .unwrap_or(false)
                    })
                    .map(element_text)
                    .filter(|text| !text.is_empty())
                    .collect()
            }
        }
    }
}

/// Scalar fields of a patent record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Title of the invention
    Title,
    /// Abstract text
    Abstract,
    /// Publication number(s)
    PublicationNumber,
    /// Application number
    ApplicationNumber,
    /// Assignee
    Assignee,
    /// Legal status
    Status,
    /// Filing date
    FilingDate,
    /// Publication date
    PublicationDate,
    /// Priority date
    PriorityDate,
    /// Claims markup
    ClaimsHtml,
    /// Description markup
    DescriptionHtml,
}

impl Field {
    /// Every scalar field
    pub const ALL: [Field; 11] = [
        Field::Title,
        Field::Abstract,
        Field::PublicationNumber,
        Field::ApplicationNumber,
        Field::Assignee,
        Field::Status,
        Field::FilingDate,
        Field::PublicationDate,
        Field::PriorityDate,
        Field::ClaimsHtml,
        Field::DescriptionHtml,
    ];
}

/// The full set of fallback chains for one provider
#[derive(Debug)]
pub struct ExtractionStrategy {
    /// Provider whose markup these tables describe
    pub provider: Provider,
    /// Title chain
    pub title: &'static [Accessor],
    /// Abstract chain
    pub abstract_text: &'static [Accessor],
    /// Publication number chain
    pub publication_number: &'static [Accessor],
    /// Application number chain
    pub application_number: &'static [Accessor],
    /// Assignee chain
    pub assignee: &'static [Accessor],
    /// Status chain
    pub status: &'static [Accessor],
    /// Filing date chain
    pub filing_date: &'static [Accessor],
    /// Publication date chain
    pub publication_date: &'static [Accessor],
    /// Priority date chain
    pub priority_date: &'static [Accessor],
    /// Claims markup chain
    pub claims_html: &'static [Accessor],
    /// Description markup chain
    pub description_html: &'static [Accessor],
    /// Inventor list chain
    pub inventors: &'static [ListSource],
    /// Drawing list chain
    pub drawings: &'static [ListSource],
    /// Repeated-row tables
    pub tables: &'static TableSet,
}

impl ExtractionStrategy {
    /// Accessor chain of a scalar field
    pub fn accessors(&self, field: Field) -> &'static [Accessor] {
        match field {
            Field::Title => self.title,
            Field::Abstract => self.abstract_text,
            Field::PublicationNumber => self.publication_number,
            Field::ApplicationNumber => self.application_number,
            Field::Assignee => self.assignee,
            Field::Status => self.status,
            Field::FilingDate => self.filing_date,
            Field::PublicationDate => self.publication_date,
            Field::PriorityDate => self.priority_date,
            Field::ClaimsHtml => self.claims_html,
            Field::DescriptionHtml => self.description_html,
        }
    }
}

/// Strategy tables for a provider
pub fn strategy_for(provider: Provider) -> &'static ExtractionStrategy {
    match provider {
        Provider::GooglePatents => &GOOGLE_PATENTS,
        Provider::Espacenet => &ESPACENET,
    }
}

/// Evaluate a fallback chain; the first non-empty result wins
///
/// # Examples
///
/// ```
/// use patentlens_extractor::{resolve_field, Accessor, PageDocument, Source};
///
/// let doc = PageDocument::parse("<h1>Widget</h1>", "https://patents.google.com/patent/US1A");
/// let chain = [Accessor::new(Source::Text("h2#title")), Accessor::new(Source::Text("h1"))];
/// assert_eq!(resolve_field(&doc, &chain).as_deref(), Some("Widget"));
/// ```
pub fn resolve_field(doc: &PageDocument, accessors: &[Accessor]) -> Option<String> {
    for (rank, accessor) in accessors.iter().enumerate() {
        let Some(raw) = accessor.source.read(doc) else {
            trace!(rank, source = ?accessor.source, "Accessor yielded nothing");
            continue;
        };
        let value = accessor.transform.apply(&raw);
        if !value.trim().is_empty() {
            debug!(rank, source = ?accessor.source, "Accessor matched");
            return Some(value);
        }
    }
    None
}

/// Evaluate a list fallback chain; the first non-empty list wins
pub fn resolve_list(doc: &PageDocument, sources: &[ListSource]) -> Vec<String> {
    for (rank, source) in sources.iter().enumerate() {
        let values = source.read(doc);
        if !values.is_empty() {
            debug!(rank, source = ?source, count = values.len(), "List accessor matched");
            return values;
        }
    }
    Vec::new()
}

/// Compiled accessor patterns, invalid ones cached as `None`
static COMPILED: Lazy<RwLock<HashMap<&'static str, Option<Regex>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn compile(pattern: &'static str) -> Option<Regex> {
    if let Some(cached) = COMPILED.read().ok().and_then(|map| map.get(pattern).cloned()) {
        return cached;
    }

    let compiled = match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            debug!(pattern, error = %e, "Ignoring invalid pattern");
            None
        }
    };
    if let Ok(mut map) = COMPILED.write() {
        map.insert(pattern, compiled.clone());
    }
    compiled
}

const fn text(css: &'static str) -> Accessor {
    Accessor::new(Source::Text(css))
}

const fn date(source: Source) -> Accessor {
    Accessor::with(source, Transform::FirstMatch(ISO_DATE))
}

/// Provider A (Google Patents)
pub static GOOGLE_PATENTS: ExtractionStrategy = ExtractionStrategy {
    provider: Provider::GooglePatents,
    title: &[
        text("h2#title"),
        Accessor::new(Source::Attr(r#"meta[name="DC.title"]"#, "content")),
        text("h1"),
        text("title"),
    ],
    abstract_text: &[
        text("div.abstract"),
        text(r#"section[itemprop="abstract"] p"#),
        text(r#"section[itemprop="abstract"]"#),
        text("abstract"),
        text("div.abstract-text"),
    ],
    publication_number: &[
        Accessor::with(
            Source::Text(r#"span[itemprop="publicationNumber"]"#),
            Transform::AllMatches(NUMBER_TOKEN, ", "),
        ),
        Accessor::new(Source::UrlPattern(URL_PUBLICATION_NUMBER)),
        Accessor::with(
            Source::Attr(r#"meta[name="DC.identifier"]"#, "content"),
            Transform::AllMatches(NUMBER_TOKEN, ", "),
        ),
    ],
    application_number: &[
        text(r#"[itemprop="applicationNumber"]"#),
        Accessor::new(Source::Attr(
            r#"meta[name="citation_patent_application_number"]"#,
            "content",
        )),
    ],
    assignee: &[
        text(r#"dd[itemprop="assigneeOriginal"]"#),
        text(r#"span[itemprop="assignee"]"#),
        text(r#"dd[itemprop="assignee"]"#),
        text("div.assignee"),
    ],
    status: &[
        text(r#"span[itemprop="status"]"#),
        text("div.status"),
        text("div.patent-status"),
    ],
    filing_date: &[
        date(Source::Text(r#"time[itemprop="filingDate"]"#)),
        date(Source::Text(r#"span[itemprop="filingDate"]"#)),
        date(Source::Text("div.filing-date")),
    ],
    publication_date: &[
        date(Source::Text(r#"time[itemprop="publicationDate"]"#)),
        date(Source::Text(r#"span[itemprop="publicationDate"]"#)),
        date(Source::Attr(r#"meta[name="DC.date"]"#, "content")),
    ],
    priority_date: &[
        date(Source::Text(r#"time[itemprop="priorityDate"]"#)),
        date(Source::Text(r#"span[itemprop="priorityDate"]"#)),
        date(Source::Text("div.priority-date")),
    ],
    claims_html: &[
        Accessor::new(Source::InnerHtml(r#"section[itemprop="claims"]"#)),
        Accessor::new(Source::InnerHtml("div.claims")),
        Accessor::new(Source::InnerHtml("div#claims")),
    ],
    description_html: &[
        Accessor::new(Source::InnerHtml(r#"section[itemprop="description"]"#)),
        Accessor::new(Source::InnerHtml("div.description")),
        Accessor::new(Source::InnerHtml("div#description")),
    ],
    inventors: &[
        ListSource::EachText(r#"[itemprop="inventor"]"#),
        ListSource::EachAttr(r#"meta[name="DC.contributor"]"#, "content"),
        ListSource::Labeled {
            values: "span.patent-bibdata-value",
            label: "span.patent-bibdata-label",
            label_text: "inventor",
        },
    ],
    drawings: &[ListSource::EachAttr(r#"meta[itemprop="full"]"#, "content")],
    tables: &GOOGLE_TABLES,
};

/// Provider B (Espacenet)
pub static ESPACENET: ExtractionStrategy = ExtractionStrategy {
    provider: Provider::Espacenet,
    title: &[
        text(r#"h1[itemprop="inventionTitle"]"#),
        text(r#"h3[itemprop="inventionTitle"]"#),
        Accessor::new(Source::Attr(r#"meta[name="DC.title"]"#, "content")),
        Accessor::with(Source::Text("title"), Transform::SplitFirst(" - ")),
        text("h1"),
    ],
    abstract_text: &[
        text(r#"section[itemprop="abstract"]"#),
        text(r#"div[itemprop="abstract"]"#),
        text("div.abstract"),
        Accessor::new(Source::Attr(r#"meta[name="description"]"#, "content")),
        text(r#"p[itemprop="abstract"]"#),
    ],
    publication_number: &[
        Accessor::with(
            Source::Text(r#"span[itemprop="publicationNumber"]"#),
            Transform::AllMatches(NUMBER_TOKEN, ", "),
        ),
        Accessor::new(Source::UrlPattern(r"pn%3D([A-Z0-9]+)")),
        Accessor::new(Source::UrlPattern(URL_PUBLICATION_NUMBER)),
    ],
    application_number: &[text(r#"span[itemprop="applicationNumber"]"#)],
    assignee: &[
        text(r#"span[itemprop="assignee"]"#),
        text(r#"span[itemprop="applicant"]"#),
    ],
    status: &[text(r#"span[itemprop="status"]"#)],
    filing_date: &[
        date(Source::Text(r#"time[itemprop="filingDate"]"#)),
        date(Source::Text(r#"span[itemprop="filingDate"]"#)),
    ],
    publication_date: &[
        date(Source::Text(r#"time[itemprop="publicationDate"]"#)),
        date(Source::Text(r#"span[itemprop="publicationDate"]"#)),
    ],
    priority_date: &[date(Source::Text(r#"span[itemprop="priorityDate"]"#))],
    claims_html: &[
        Accessor::new(Source::InnerHtml(r#"section[itemprop="claims"]"#)),
        Accessor::new(Source::InnerHtml("div.claims")),
    ],
    description_html: &[
        Accessor::new(Source::InnerHtml(r#"section[itemprop="description"]"#)),
        Accessor::new(Source::InnerHtml("div.description")),
    ],
    inventors: &[ListSource::EachText(r#"span[itemprop="inventor"]"#)],
    drawings: &[ListSource::EachLink {
        css: r#"img[itemprop="thumbnail"], meta[itemprop="image"]"#,
        attrs: &["src", "content"],
        base: "https://worldwide.espacenet.com",
    }],
    tables: &ESPACENET_TABLES,
};
