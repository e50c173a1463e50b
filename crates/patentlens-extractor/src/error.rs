//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur while setting up extraction
///
/// Missing fields, failed probes and odd timelines are not errors; they
/// degrade to the record's not-found markers.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl From<toml::de::Error> for ExtractorError {
    fn from(e: toml::de::Error) -> Self {
        ExtractorError::TomlParse(e.to_string())
    }
}

/// Errors raised while routing an inbound identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The identifier cannot be turned into a fetchable provider URL
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}
