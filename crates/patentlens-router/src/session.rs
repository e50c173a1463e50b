//! Session tokens.
//!
//! A session token is an HS256 JWT whose subject is the account id. The
//! proxy only asks whether a presented token verifies; the claims are read
//! back when the caller needs to know who signed in.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Session token failure
#[derive(Debug, Error)]
pub enum SessionError {
    /// Signing the claims failed
    #[error("Could not sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Signature is valid but `exp` has passed
    #[error("Session has expired")]
    Expired,

    /// Malformed, wrongly signed or missing required claims
    #[error("Session token rejected")]
    Rejected,
}

/// Registered claims plus the account e-mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id
    pub sub: String,
    /// Account e-mail at sign-in
    pub email: String,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiry (Unix seconds)
    pub exp: u64,
}

/// Issues and checks session tokens for one signing secret
pub struct SessionManager {
    signing: EncodingKey,
    checking: DecodingKey,
    validation: Validation,
    lifetime_secs: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

impl SessionManager {
    /// Manager signing with `secret`; tokens live for `lifetime_secs`
    ///
    /// Expiry is checked without leeway.
    pub fn new(secret: &str, lifetime_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            signing: EncodingKey::from_secret(secret.as_bytes()),
            checking: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime_secs,
        }
    }

    /// Sign a token for `account_id`, valid for the configured lifetime.
    pub fn issue(&self, account_id: &str, email: &str) -> Result<String, SessionError> {
        let iat = unix_now();
        let claims = SessionClaims {
            sub: account_id.to_owned(),
            email: email.to_owned(),
            iat,
            exp: iat + self.lifetime_secs,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.signing,
        )?)
    }

    /// Claims of a token that verifies.
    pub fn claims(&self, token: &str) -> Result<SessionClaims, SessionError> {
        jsonwebtoken::decode::<SessionClaims>(token, &self.checking, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Rejected,
            })
    }

    /// Whether `token` verifies and has not expired
    pub fn verify(&self, token: &str) -> bool {
        self.claims(token).is_ok()
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
