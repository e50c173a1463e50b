//! HTTP request handlers for the Router service.
//!
//! Implements the proxy, token verification, Google login and health check
//! endpoints using axum.

use crate::pipeline::{PipelineError, ProxyOutcome, ProxyPipeline};
use crate::session::{bearer_token, SessionError, SessionManager};
use crate::users::{federated_login, InMemoryUserRepository, LoginError};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use patentlens_extractor::RouteError;
use patentlens_fetch::{FetchError, FetchedDocument};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Session manager for JWT token operations
    pub session_manager: Arc<SessionManager>,
    /// Account storage for Google sign-in
    pub users: Arc<InMemoryUserRepository>,
    /// Route/fetch/extract pipeline
    pub pipeline: Arc<ProxyPipeline>,
}

/// Query string of `/api/proxy`
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    /// Identifier to proxy: a URL or a bare publication number
    pub url: Option<String>,
}

/// Google login request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    /// Account e-mail
    #[serde(default)]
    pub email: String,
    /// Google account id
    #[serde(default)]
    pub google_id: String,
}

/// Issued session token
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT session token
    pub token: String,
}

/// Token verification result
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    /// Whether the presented token verifies
    pub valid: bool,
    /// Reason a token did not verify
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid session token
    Unauthorized(String),
    /// Malformed request
    BadRequest(String),
    /// Identifier could not be routed
    Route(RouteError),
    /// Primary upstream fetch failed
    Upstream(FetchError),
    /// Token could not be issued
    Session(SessionError),
    /// Google sign-in rejected or failed
    Login(LoginError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::Route(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(e) => e
                .status()
                .and_then(|status| StatusCode::from_u16(status).ok())
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Login(LoginError::MissingCredentials) => StatusCode::BAD_REQUEST,
            AppError::Login(LoginError::AccountMismatch) => StatusCode::UNAUTHORIZED,
            AppError::Login(LoginError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Unauthorized(msg) | AppError::BadRequest(msg) => msg,
            AppError::Route(e) => e.to_string(),
            AppError::Upstream(e) => e.to_string(),
            AppError::Session(e) => e.to_string(),
            AppError::Login(e) => e.to_string(),
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "Request failed");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Route(e) => AppError::Route(e),
            PipelineError::Upstream(e) => AppError::Upstream(e),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl From<LoginError> for AppError {
    fn from(e: LoginError) -> Self {
        AppError::Login(e)
    }
}

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let token = presented_token(headers)
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;
    if !state.session_manager.verify(token) {
        return Err(AppError::Unauthorized("Invalid token".to_string()));
    }
    Ok(())
}

/// Stream a fetched document back with its content headers
fn stream_response(document: FetchedDocument) -> Response {
    let content_type = HeaderValue::from_str(&document.content_type).ok();
    let disposition = document
        .content_disposition
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok());

    let mut response = Body::from_stream(document.body).into_response();
    let headers = response.headers_mut();
    if let Some(value) = content_type {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Some(value) = disposition {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    response
}

/// GET /api/proxy?url= - Extract a patent page or pass a document through
async fn proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ProxyParams>,
) -> Result<Response, AppError> {
    authorize(&state, &headers)?;

    let url = params
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("URL parameter is required".to_string()))?;

    match state.pipeline.process(&url).await? {
        ProxyOutcome::Patent(envelope) => Ok(Json(envelope).into_response()),
        ProxyOutcome::Stream(document) => Ok(stream_response(document)),
    }
}

/// POST /api/verify-token - Check the presented bearer token
async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<VerifyTokenResponse>) {
    let (status, error) = match presented_token(&headers) {
        None => (StatusCode::UNAUTHORIZED, Some("No token provided")),
        Some(token) if state.session_manager.verify(token) => (StatusCode::OK, None),
        Some(_) => (StatusCode::UNAUTHORIZED, Some("Invalid token")),
    };

    (
        status,
        Json(VerifyTokenResponse {
            valid: error.is_none(),
            error: error.map(str::to_string),
        }),
    )
}

/// POST /api/google-login - Find or create the account and issue a token
async fn google_login(
    State(state): State<AppState>,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let account = federated_login(state.users.as_ref(), &request.email, &request.google_id)?;
    let token = state
        .session_manager
        .issue(&account.id.to_string(), &account.email)?;

    info!(user_id = %account.id, "Issued session token");
    Ok(Json(TokenResponse { token }))
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// CORS policy for the configured browser origins
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/api/proxy", get(proxy))
        .route("/api/verify-token", post(verify_token))
        .route("/api/google-login", post(google_login))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use patentlens_extractor::ExtractorConfig;
    use patentlens_fetch::{DisabledProber, MockFetcher};
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> AppState {
        AppState {
            session_manager: Arc::new(SessionManager::new("test-secret", 3600)),
            users: Arc::new(InMemoryUserRepository::new()),
            pipeline: Arc::new(
                ProxyPipeline::new(
                    Arc::new(MockFetcher::new()),
                    Arc::new(DisabledProber),
                    ExtractorConfig::default(),
                )
                .unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_proxy_requires_token() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/api/proxy?url=US1234567B1")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_proxy_requires_url() {
        let state = create_test_state();
        let token = state.session_manager.issue("u", "u@example.com").unwrap();
        let app = create_router(state);

        let request = Request::builder()
            .uri("/api/proxy")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_status_mapping() {
        let not_found = AppError::Upstream(FetchError::Status {
            status: 404,
            reason: "gone".to_string(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let timeout = AppError::Upstream(FetchError::Timeout("slow".to_string()));
        assert_eq!(timeout.status(), StatusCode::BAD_GATEWAY);
    }
}
