//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::user::UserAccount;

/// Trait for storing and retrieving user accounts
///
/// Implemented by the infrastructure layer (patentlens-router). Methods take
/// `&self` so one repository can be shared between concurrent requests.
pub trait UserRepository {
    /// Error type for repository operations
    type Error;

    /// Look up an account by e-mail address
    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, Self::Error>;

    /// Store a new account; fails if the e-mail is already registered
    fn create(&self, account: UserAccount) -> Result<UserAccount, Self::Error>;

    /// Replace an existing account, matched by id
    fn update(&self, account: &UserAccount) -> Result<(), Self::Error>;
}
