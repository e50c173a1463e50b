//! CLI configuration file.
//!
//! ```toml
//! [output]
//! color = false
//! format = "json"
//!
//! [fetch]
//! timeout_secs = 10
//!
//! [extractor]
//! document_host = "patentimages.storage.googleapis.com"
//! ```
//!
//! Every section is optional.

use crate::error::{CliError, Result};
use patentlens_extractor::ExtractorConfig;
use patentlens_fetch::FetchSettings;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputSettings,
    pub fetch: FetchSettings,
    pub extractor: ExtractorConfig,
}

/// How results are printed unless overridden on the command line
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub color: bool,
    pub format: OutputFormat,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Config {
    /// Parse a config file and check its `[extractor]` section.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Config = toml::from_str(&std::fs::read_to_string(path)?)?;
        config.extractor.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_no_file_means_defaults() {
        let config = Config::load(None).unwrap();
        assert!(config.output.color);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.fetch, FetchSettings::default());
        assert_eq!(config.extractor, ExtractorConfig::default());
    }

    #[test]
    fn test_sections_override_defaults() {
        let file = write_config(
            r#"
[output]
color = false
format = "json"

[fetch]
timeout_secs = 5

[extractor]
max_unwrap_depth = 2
"#,
        );

        let config = Config::load(Some(file.path())).unwrap();
        assert!(!config.output.color);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.extractor.max_unwrap_depth, 2);
    }

    #[test]
    fn test_partial_output_section() {
        let file = write_config("[output]\nformat = \"json\"\n");
        let config = Config::from_file(file.path()).unwrap();
        assert!(config.output.color);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_bad_extractor_section() {
        let file = write_config("[extractor]\ndocument_extension = \"pdf\"\n");
        assert!(matches!(Config::from_file(file.path()), Err(CliError::Config(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[output\ncolor = ");
        assert!(matches!(Config::from_file(file.path()), Err(CliError::Toml(_))));
    }
}
