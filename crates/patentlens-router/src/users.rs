//! Account storage and federated login.
//!
//! Accounts live in memory; any other store only has to implement
//! [`UserRepository`].

use patentlens_domain::{traits::UserRepository, UserAccount};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// Repository error
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// E-mail already registered
    #[error("Account already exists: {0}")]
    DuplicateEmail(String),

    /// Account not found
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Lock poisoned by a panicking writer
    #[error("Account store unavailable")]
    Unavailable,
}

/// Federated login error
#[derive(Debug, Error)]
pub enum LoginError {
    /// E-mail or Google id missing
    #[error("Email and Google ID are required")]
    MissingCredentials,

    /// The account is linked to another Google id
    #[error("Invalid Google account")]
    AccountMismatch,

    /// Storage failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// In-memory [`UserRepository`]
#[derive(Default)]
pub struct InMemoryUserRepository {
    accounts: Arc<RwLock<Vec<UserAccount>>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub fn account_count(&self) -> usize {
        self.accounts.read().map(|accounts| accounts.len()).unwrap_or(0)
    }
}

impl UserRepository for InMemoryUserRepository {
    type Error = RepositoryError;

    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, Self::Error> {
        let accounts = self.accounts.read().map_err(|_| RepositoryError::Unavailable)?;
        Ok(accounts.iter().find(|account| account.email == email).cloned())
    }

    fn create(&self, account: UserAccount) -> Result<UserAccount, Self::Error> {
        let mut accounts = self.accounts.write().map_err(|_| RepositoryError::Unavailable)?;
        if accounts.iter().any(|existing| existing.email == account.email) {
            return Err(RepositoryError::DuplicateEmail(account.email));
        }
        accounts.push(account.clone());
        Ok(account)
    }

    fn update(&self, account: &UserAccount) -> Result<(), Self::Error> {
        let mut accounts = self.accounts.write().map_err(|_| RepositoryError::Unavailable)?;
        let existing = accounts
            .iter_mut()
            .find(|existing| existing.id == account.id)
            .ok_or_else(|| RepositoryError::NotFound(account.id.to_string()))?;
        *existing = account.clone();
        Ok(())
    }
}

/// Find or create the account for a Google sign-in
///
/// A new e-mail gets a new account. An existing account without a Google id
/// is linked to this one; an account linked to a different id is rejected.
pub fn federated_login<R>(repository: &R, email: &str, google_id: &str) -> Result<UserAccount, LoginError>
where
    R: UserRepository<Error = RepositoryError>,
{
    let email = email.trim();
    let google_id = google_id.trim();
    if email.is_empty() || google_id.is_empty() {
        return Err(LoginError::MissingCredentials);
    }

    match repository.find_by_email(email)? {
        None => {
            let account = repository.create(UserAccount::new(email, Some(google_id.to_string())))?;
            info!(user_id = %account.id, "Created account from Google sign-in");
            Ok(account)
        }
        Some(account) => match account.google_id.as_deref() {
            Some(linked) if linked == google_id => Ok(account),
            Some(_) => {
                warn!(user_id = %account.id, "Google id does not match linked account");
                Err(LoginError::AccountMismatch)
            }
            None => {
                let linked = UserAccount {
                    google_id: Some(google_id.to_string()),
                    ..account
                };
                repository.update(&linked)?;
                info!(user_id = %linked.id, "Linked Google id to existing account");
                Ok(linked)
            }
        },
    }
}
