//! Patentlens Router
//!
//! HTTP front end of Patentlens: the authenticated `/api/proxy` endpoint
//! that routes, fetches and extracts patent documents, plus token
//! verification and Google sign-in.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod pipeline;
pub mod session;
pub mod users;

use config::RouterConfig;
use handlers::{cors_layer, create_router, AppState};
use patentlens_extractor::ExtractorError;
use patentlens_fetch::{ChallengeFallback, DocumentFetcher, FetchError, HttpFetcher, Prober, RenderingFetcher};
use pipeline::ProxyPipeline;
use session::SessionManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use users::InMemoryUserRepository;

/// Router error
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Upstream client could not be built
    #[error("Fetcher error: {0}")]
    Fetch(#[from] FetchError),

    /// Extraction settings rejected
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the proxy pipeline described by `config`
///
/// The direct HTTP fetcher doubles as the prober. With a `[rendering]`
/// section, challenged pages are re-fetched through the rendering service.
pub fn build_pipeline(config: &RouterConfig) -> Result<ProxyPipeline, RouterError> {
    let http = Arc::new(HttpFetcher::new(config.fetch.clone())?);

    let fetcher: Arc<dyn DocumentFetcher> = match &config.rendering {
        Some(settings) => {
            info!(endpoint = %settings.endpoint, "Bot-challenge fallback enabled");
            let rendering = RenderingFetcher::new(settings.clone())?;
            Arc::new(ChallengeFallback::new(http.clone(), rendering))
        }
        None => http.clone(),
    };
    let prober: Arc<dyn Prober> = http;

    Ok(ProxyPipeline::new(fetcher, prober, config.extractor.clone())?)
}

/// Start the Router HTTP server
///
/// Initializes logging, builds the pipeline and session manager, and
/// starts the axum server.
pub async fn start_server(config: RouterConfig) -> Result<(), RouterError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Patentlens Router");
    info!("Bind address: {}", config.bind_addr());
    info!("Token expiry: {} seconds", config.token_expiry_secs);
    info!("CORS origins: {}", config.cors_origins.len());

    let state = AppState {
        session_manager: Arc::new(SessionManager::new(
            &config.jwt_secret,
            config.token_expiry_secs,
        )),
        users: Arc::new(InMemoryUserRepository::new()),
        pipeline: Arc::new(build_pipeline(&config)?),
    };

    let app = create_router(state).layer(cors_layer(&config.cors_origins));

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Router listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| RouterError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_pipeline_from_test_config() {
        let config = RouterConfig::default_test_config();
        assert!(build_pipeline(&config).is_ok());
    }

    #[test]
    fn test_build_pipeline_with_rendering() {
        let mut config = RouterConfig::default_test_config();
        config.rendering = Some(patentlens_fetch::RenderingSettings::default());
        assert!(build_pipeline(&config).is_ok());
    }

    #[test]
    fn test_build_pipeline_rejects_bad_extractor() {
        let mut config = RouterConfig::default_test_config();
        config.extractor.constructed_url_template = "https://example.com/fixed.pdf".to_string();
        assert!(matches!(
            build_pipeline(&config),
            Err(RouterError::Extractor(_))
        ));
    }
}
