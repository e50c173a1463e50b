//! Patentlens Domain Layer
//!
//! This crate contains the domain model shared by every other Patentlens
//! crate. It defines the patent record produced by extraction, the value
//! objects it is built from, and the trait interfaces that infrastructure
//! crates implement.
//!
//! ## Key Concepts
//!
//! - **PatentRecord**: The normalized, immutable output of one extraction
//! - **PatentDate**: A calendar date or the explicit `unknown` marker
//! - **TimelineEvent**: One entry of the reconstructed event history, with
//!   the `STATUS` sentinel always ordered last
//! - **Provider**: The public source a document came from
//! - **PublicationNumber**: A normalized `CC123456K1` style identifier
//!
//! ## Architecture
//!
//! - No I/O, no HTTP, no HTML parsing
//! - Infrastructure implementations live in other crates
//! - Trait definitions for external interactions (user persistence)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod date;
pub mod provider;
pub mod publication;
pub mod record;
pub mod timeline;
pub mod traits;
pub mod user;

// Re-exports for convenience
pub use date::PatentDate;
pub use provider::Provider;
pub use publication::PublicationNumber;
pub use record::{
    group_family_by_year, Citation, Classification, FamilyMember, FamilyYearGroup, LegalEvent,
    PatentEnvelope, PatentRecord, SimilarDocument,
};
pub use timeline::{EventOrder, TimelineEvent, STATUS_SENTINEL};
pub use user::{UserAccount, UserId};
