//! Publication number value object

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Country code, serial digits, kind code letter, optional kind digit
static PUBLICATION_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Z]{2}\d+[A-Z]\d?").expect("publication number pattern is valid")
});

static EXACT_PUBLICATION_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{2}\d+[A-Z]\d?$").expect("publication number pattern is valid")
});

/// A normalized publication number such as `US8900904B2`
///
/// # Examples
///
/// ```
/// use patentlens_domain::PublicationNumber;
///
/// let number = PublicationNumber::find("publication/US8900904B2?q=x").unwrap();
/// assert_eq!(number.as_str(), "US8900904B2");
/// assert_eq!(number.document_stem(), "us8900904b2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicationNumber(String);

impl PublicationNumber {
    /// Find the first publication number embedded in arbitrary text
    pub fn find(text: &str) -> Option<Self> {
        PUBLICATION_NUMBER
            .find(text)
            .map(|m| PublicationNumber(m.as_str().to_string()))
    }

    /// Parse a string that must consist of a publication number only
    ///
    /// Surrounding whitespace is ignored and letters are upper-cased.
    pub fn parse_exact(text: &str) -> Option<Self> {
        let candidate = text.trim().to_ascii_uppercase();
        EXACT_PUBLICATION_NUMBER
            .is_match(&candidate)
            .then(|| PublicationNumber(candidate))
    }

    /// The number as printed
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-letter country code
    pub fn country(&self) -> &str {
        &self.0[..2]
    }

    /// Lower-cased form used in document file names
    pub fn document_stem(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for PublicationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: any well-formed number is found inside surrounding noise
        #[test]
        fn test_find_roundtrip(
            country in "[A-Z]{2}",
            serial in "[0-9]{4,11}",
            kind in "[A-Z]",
            kind_digit in "[0-9]?",
        ) {
            let number = format!("{}{}{}{}", country, serial, kind, kind_digit);
            let text = format!("/publication/{}?q=1", number);
            let found = PublicationNumber::find(&text);
            prop_assert_eq!(found.map(|n| n.0), Some(number));
        }
    }
}
