//! The patent record - the output of one extraction

use crate::date::PatentDate;
use crate::provider::Provider;
use crate::timeline::TimelineEvent;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One classification code (CPC or IPC)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Classification symbol, e.g. `G06F16/00`
    pub code: String,
    /// Human-readable description of the symbol
    pub description: String,
}

/// A cited or citing patent document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Publication number of the other document
    pub number: String,
    /// Publication date as printed
    pub date: String,
    /// Title of the other document
    pub title: String,
    /// Assignee of the other document
    pub assignee: String,
}

/// A member of the patent's family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    /// Publication number of the family member
    pub number: String,
    /// Publication date as printed
    pub date: String,
    /// Country or office of the family member
    pub country: String,
}

/// A document the provider considers similar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarDocument {
    /// Publication number
    pub number: String,
    /// Publication date as printed
    pub date: String,
    /// Title
    pub title: String,
}

/// A row of the legal events table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalEvent {
    /// Event date as printed
    pub date: String,
    /// Event code or description
    pub description: String,
}

/// Family members sharing a publication year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyYearGroup {
    /// Four-digit year, or `unknown`
    pub year: String,
    /// Members in their original order
    pub members: Vec<FamilyMember>,
}

/// Normalized, structured record for a single patent
///
/// Every field is always present. Text fields use the empty string as the
/// not-found marker, dates use [`PatentDate::Unknown`], sequences are empty
/// and `document_url` serializes as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatentRecord {
    /// Publication number(s), comma-separated when several are printed
    pub publication_number: String,
    /// Application number
    pub application_number: String,
    /// Title of the invention
    pub title: String,
    /// Abstract text
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Inventor names in page order
    pub inventors: Vec<String>,
    /// Current or original assignee
    pub assignee: String,
    /// Legal status (e.g. "Active")
    pub status: String,
    /// Filing date
    pub filing_date: PatentDate,
    /// Publication date
    pub publication_date: PatentDate,
    /// Earliest priority date
    pub priority_date: PatentDate,
    /// Classification codes in page order
    pub classifications: Vec<Classification>,
    /// Backward citations
    pub citations: Vec<Citation>,
    /// Forward citations
    pub cited_by: Vec<Citation>,
    /// Family members
    pub family: Vec<FamilyMember>,
    /// Similar documents
    pub similar_documents: Vec<SimilarDocument>,
    /// Legal events table
    pub legal_events: Vec<LegalEvent>,
    /// Reconciled event timeline, status sentinel last
    pub events: Vec<TimelineEvent>,
    /// Drawing image URLs
    pub drawings: Vec<String>,
    /// Verified original-document (PDF) URL
    pub document_url: Option<String>,
    /// Claims markup, unmodified
    pub claims_html: String,
    /// Description markup, unmodified
    pub description_html: String,
}

/// Response body for an extracted patent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatentEnvelope {
    /// Always `"patent"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Provider whose document was extracted
    pub source: Provider,
    /// Provider the caller asked for
    pub requested_source: Provider,
    /// The extracted record
    pub data: PatentRecord,
}

impl PatentEnvelope {
    /// Wrap a record extracted from `source` for a request aimed at `requested_source`
    pub fn new(source: Provider, requested_source: Provider, data: PatentRecord) -> Self {
        Self {
            kind: "patent".to_string(),
            source,
            requested_source,
            data,
        }
    }
}

/// Group family members by publication year
///
/// Groups are ordered by year with `unknown` last; members keep their
/// original relative order.
pub fn group_family_by_year(members: &[FamilyMember]) -> Vec<FamilyYearGroup> {
    let mut by_year: BTreeMap<Option<i32>, Vec<FamilyMember>> = BTreeMap::new();
    for member in members {
        let year = PatentDate::parse(&member.date).as_naive().map(|date| date.year());
        by_year.entry(year).or_default().push(member.clone());
    }

    // BTreeMap puts None first; move it to the end
    let unknown = by_year.remove(&None);
    let mut groups: Vec<FamilyYearGroup> = by_year
        .into_iter()
        .map(|(year, members)| FamilyYearGroup {
            year: year.map(|y| y.to_string()).unwrap_or_default(),
            members,
        })
        .collect();
    if let Some(members) = unknown {
        groups.push(FamilyYearGroup {
            year: crate::date::UNKNOWN_DATE.to_string(),
            members,
        });
    }
    groups
}
