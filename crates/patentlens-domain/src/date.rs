//! Calendar dates as printed on patent pages

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Literal used on the wire for a date that could not be read
pub const UNKNOWN_DATE: &str = "unknown";

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("ISO date pattern is valid"));

/// A filing, publication or priority date
///
/// Variant order matters: every `Known` date sorts before `Unknown`.
///
/// # Examples
///
/// ```
/// use patentlens_domain::PatentDate;
///
/// let date = PatentDate::parse("Published 2014-12-02");
/// assert_eq!(date.to_string(), "2014-12-02");
/// assert!(PatentDate::parse("soon").is_unknown());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PatentDate {
    /// A well-formed calendar date
    Known(NaiveDate),
    /// Missing or unparseable
    #[default]
    Unknown,
}

impl PatentDate {
    /// Parse the first ISO `YYYY-MM-DD` date embedded in `text`
    pub fn parse(text: &str) -> Self {
        ISO_DATE
            .find(text)
            .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
            .map(PatentDate::Known)
            .unwrap_or(PatentDate::Unknown)
    }

    /// Parse an optional extracted value, treating `None` as unknown
    pub fn from_extracted(text: Option<&str>) -> Self {
        text.map(Self::parse).unwrap_or_default()
    }

    /// Whether this is the unknown marker
    pub fn is_unknown(&self) -> bool {
        matches!(self, PatentDate::Unknown)
    }

    /// The underlying calendar date, if known
    pub fn as_naive(&self) -> Option<NaiveDate> {
        match self {
            PatentDate::Known(date) => Some(*date),
            PatentDate::Unknown => None,
        }
    }
}

impl fmt::Display for PatentDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatentDate::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PatentDate::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

impl Serialize for PatentDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PatentDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(PatentDate::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_iso_date() {
        let date = PatentDate::parse("2010-03-08");
        assert_eq!(
            date,
            PatentDate::Known(NaiveDate::from_ymd_opt(2010, 3, 8).unwrap())
        );
    }

    #[test]
    fn test_parse_embedded_date() {
        let date = PatentDate::parse("Priority to 2009-10-14 (US)");
        assert_eq!(date.to_string(), "2009-10-14");
    }

    #[test]
    fn test_invalid_calendar_date_is_unknown() {
        assert!(PatentDate::parse("2010-13-45").is_unknown());
        assert!(PatentDate::parse("").is_unknown());
    }

    #[test]
    fn test_known_sorts_before_unknown() {
        let known = PatentDate::parse("2999-12-31");
        assert!(known < PatentDate::Unknown);
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&PatentDate::parse("2012-04-19")).unwrap();
        assert_eq!(json, "\"2012-04-19\"");
        let json = serde_json::to_string(&PatentDate::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
    }
}
