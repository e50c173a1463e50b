//! Public patent document providers

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two public sites whose patent pages Patentlens understands
///
/// Google Patents exposes structured micro-data and is the provider the
/// live pipeline extracts from. Espacenet pages are rewritten into Google
/// Patents requests before fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// patents.google.com
    #[serde(rename = "google")]
    GooglePatents,
    /// worldwide.espacenet.com
    Espacenet,
}

impl Provider {
    /// Short wire name ("google" or "espacenet")
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GooglePatents => "google",
            Provider::Espacenet => "espacenet",
        }
    }

    /// Public origin of the provider's site
    pub fn origin(&self) -> &'static str {
        match self {
            Provider::GooglePatents => "https://patents.google.com",
            Provider::Espacenet => "https://worldwide.espacenet.com",
        }
    }

    /// Parse a wire name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "google" | "google-patents" => Some(Provider::GooglePatents),
            "espacenet" => Some(Provider::Espacenet),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(Provider::GooglePatents.as_str(), "google");
        assert_eq!(Provider::from_name("Espacenet"), Some(Provider::Espacenet));
        assert_eq!(Provider::from_name("uspto"), None);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Provider::GooglePatents).unwrap(),
            "\"google\""
        );
        assert_eq!(
            serde_json::to_string(&Provider::Espacenet).unwrap(),
            "\"espacenet\""
        );
    }
}
