//! Configuration for the Extractor

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the lower-cased publication number
pub const STEM_PLACEHOLDER: &str = "{stem}";

/// Configuration for extraction, link resolution and routing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Host fragment a verified document URL must contain
    pub document_host: String,

    /// Extension a verified document URL path must end with
    pub document_extension: String,

    /// Origin that relative anchor hrefs are resolved against
    pub link_origin: String,

    /// Template for the constructed document URL; contains `{stem}`
    pub constructed_url_template: String,

    /// Canonical patent URL prefix of Provider A
    pub patent_base_url: String,

    /// Maximum number of nested proxy wrappers unwrapped
    pub max_unwrap_depth: usize,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.document_host.is_empty() {
            return Err("document_host must not be empty".to_string());
        }
        if !self.document_extension.starts_with('.') {
            return Err("document_extension must start with '.'".to_string());
        }
        if !self.constructed_url_template.contains(STEM_PLACEHOLDER) {
            return Err(format!(
                "constructed_url_template must contain {}",
                STEM_PLACEHOLDER
            ));
        }
        if !self.link_origin.starts_with("http") {
            return Err("link_origin must be an http(s) URL".to_string());
        }
        if !self.patent_base_url.starts_with("http") {
            return Err("patent_base_url must be an http(s) URL".to_string());
        }
        if self.max_unwrap_depth == 0 {
            return Err("max_unwrap_depth must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Build the constructed document URL for a lower-cased publication number
    pub fn constructed_url(&self, stem: &str) -> String {
        self.constructed_url_template.replace(STEM_PLACEHOLDER, stem)
    }

    /// Canonical Provider A URL for a publication number
    pub fn patent_url(&self, publication_number: &str) -> String {
        format!(
            "{}/{}",
            self.patent_base_url.trim_end_matches('/'),
            publication_number
        )
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate().map_err(ExtractorError::Config)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            document_host: "patentimages.storage.googleapis.com".to_string(),
            document_extension: ".pdf".to_string(),
            link_origin: "https://patents.google.com".to_string(),
            constructed_url_template:
                "https://patentimages.storage.googleapis.com/patents/{stem}.pdf".to_string(),
            patent_base_url: "https://patents.google.com/patent".to_string(),
            max_unwrap_depth: 5,
        }
    }
}
