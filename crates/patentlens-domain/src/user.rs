//! User accounts consumed by the auth collaborator

use std::fmt;

/// Unique identifier for a user account based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(u128);

impl UserId {
    /// Generate a new UUIDv7-based UserId
    ///
    /// # Examples
    ///
    /// ```
    /// use patentlens_domain::UserId;
    ///
    /// let id = UserId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a UserId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Account identifier
    pub id: UserId,
    /// Login e-mail, unique per repository
    pub email: String,
    /// Linked Google account id, if any
    pub google_id: Option<String>,
}

impl UserAccount {
    /// Create a new account with a fresh identifier
    pub fn new(email: impl Into<String>, google_id: Option<String>) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            google_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accounts_get_distinct_ids() {
        let a = UserAccount::new("a@example.com", None);
        let b = UserAccount::new("b@example.com", Some("g-1".to_string()));
        assert_ne!(a.id, b.id);
        assert_eq!(b.google_id.as_deref(), Some("g-1"));
    }

    #[test]
    fn test_display_is_uuid() {
        let id = UserId::from_value(1);
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000001");
    }
}
