//! Router settings.
//!
//! One TOML file drives the server: where to listen, how sessions are
//! signed, which browser origins may call in, and the `[fetch]`,
//! `[extractor]` and optional `[rendering]` sections handed to the pipeline.

use patentlens_extractor::ExtractorConfig;
use patentlens_fetch::{FetchSettings, RenderingSettings};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Overrides `jwt_secret` when set and non-empty
pub const JWT_SECRET_ENV: &str = "PATENTLENS_JWT_SECRET";

const DEV_SECRET: &str = "patentlens-dev-secret-not-for-deployment";

/// Router configuration failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Cannot read router config: {0}")]
    Read(#[from] std::io::Error),

    /// File is not valid TOML for [`RouterConfig`]
    #[error("Malformed router config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Required value absent or empty
    #[error("Router config is missing `{0}`")]
    Missing(&'static str),

    /// Value present but unusable
    #[error("Router config rejected: {0}")]
    Invalid(String),
}

/// Router settings loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Listen address, e.g. `127.0.0.1`
    pub bind_address: String,
    /// Listen port
    pub bind_port: u16,

    /// Session signing secret, usually supplied through [`JWT_SECRET_ENV`]
    #[serde(default)]
    pub jwt_secret: String,

    /// Session lifetime
    #[serde(default = "one_hour")]
    pub token_expiry_secs: u64,

    /// Browser origins allowed to call the API
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Upstream request settings
    #[serde(default)]
    pub fetch: FetchSettings,

    /// Extraction and link-verification settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Present only when bot-challenged pages should be re-fetched through
    /// a rendering service
    #[serde(default)]
    pub rendering: Option<RenderingSettings>,
}

fn one_hour() -> u64 {
    60 * 60
}

impl RouterConfig {
    /// Read, apply the secret override, then validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::parse(&std::fs::read_to_string(path)?)?;

        if let Some(secret) = std::env::var(JWT_SECRET_ENV).ok().filter(|s| !s.is_empty()) {
            config.jwt_secret = secret;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text without validating it.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Check the secret, session lifetime and nested sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("jwt_secret"));
        }
        if self.token_expiry_secs == 0 {
            return Err(ConfigError::Invalid(
                "token_expiry_secs must be at least one second".to_string(),
            ));
        }
        self.extractor.validate().map_err(ConfigError::Invalid)?;

        match &self.rendering {
            Some(rendering) if rendering.endpoint.is_empty() => {
                Err(ConfigError::Missing("rendering.endpoint"))
            }
            _ => Ok(()),
        }
    }

    /// Loopback development settings with a throwaway secret.
    pub fn default_test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            jwt_secret: DEV_SECRET.to_string(),
            token_expiry_secs: one_hour(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            fetch: FetchSettings::default(),
            extractor: ExtractorConfig::default(),
            rendering: None,
        }
    }

    /// `address:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_settings_validate() {
        let config = RouterConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.token_expiry_secs, 3600);
        assert!(config.rendering.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_file() {
        let config = RouterConfig::parse(
            r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            jwt_secret = "from-file"
            token_expiry_secs = 900
            cors_origins = ["http://localhost:3000", "https://app.example.com"]

            [fetch]
            timeout_secs = 20

            [extractor]
            document_host = "patentimages.storage.googleapis.com"

            [rendering]
            endpoint = "https://render.example.com/v1/queries"
            username = "user"
            password = "pass"
        "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.token_expiry_secs, 900);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.fetch.timeout_secs, 20);
        assert_eq!(config.extractor.document_extension, ".pdf");
        assert_eq!(config.rendering.unwrap().username, "user");
    }

    #[test]
    fn test_sections_are_optional() {
        let config = RouterConfig::parse(
            r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            jwt_secret = "s"
        "#,
        )
        .unwrap();
        assert_eq!(config.token_expiry_secs, 3600);
        assert!(config.cors_origins.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_required() {
        let mut config = RouterConfig::default_test_config();
        config.jwt_secret.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("jwt_secret"))));
    }

    #[test]
    fn test_empty_rendering_endpoint_rejected() {
        let mut config = RouterConfig::default_test_config();
        config.rendering = Some(RenderingSettings {
            endpoint: String::new(),
            ..RenderingSettings::default()
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("rendering.endpoint"))
        ));
    }

    #[test]
    fn test_bad_extractor_section_rejected() {
        let mut config = RouterConfig::default_test_config();
        config.extractor.document_host.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unreadable_file() {
        let result = RouterConfig::from_file("/nonexistent/patentlens-router.toml");
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}
