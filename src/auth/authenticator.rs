//! Credential backends
//!
//! The gate never checks passwords itself. It calls into an
//! [`Authenticator`], which decides whether a username/password pair is
//! valid and whether an authenticated subject may perform a request.

use bcrypt::{hash, verify, DEFAULT_COST};
use std::collections::HashMap;

use crate::configuration::UserSettings;
use crate::error::ConfigError;

/// Hash a password using bcrypt, producing a `password_hash` entry for
/// the `users` configuration section
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, ConfigError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ConfigError::InvalidValue(format!("Password hashing failed: {}", e)))
}

/// Facts about the inbound request handed to [`Authenticator::authorize`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub peer_addr: Option<String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            peer_addr: None,
        }
    }

    pub fn with_peer_addr(mut self, peer_addr: String) -> Self {
        self.peer_addr = Some(peer_addr);
        self
    }
}

/// Pluggable credential store
pub trait Authenticator: Send + Sync {
    /// Return `true` if `password` is valid for `username`
    fn authenticate(&self, username: &str, password: &str) -> bool;

    /// Called after a token has been verified. Allows everything by default.
    fn authorize(&self, _username: &str, _request: &RequestContext) -> bool {
        true
    }
}

/// Username to bcrypt hash table, typically loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentials {
    users: HashMap<String, String>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with an already-computed bcrypt hash
    pub fn with_user(mut self, username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        self.users.insert(username.into(), password_hash.into());
        self
    }

    pub fn from_settings(users: &[UserSettings]) -> Self {
        users.iter().fold(Self::new(), |store, user| {
            store.with_user(user.username.clone(), user.password_hash.clone())
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Authenticator for InMemoryCredentials {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        let Some(hash) = self.users.get(username) else {
            return false;
        };

        match verify(password, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(username = %username, "Password verification failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the tests fast
    fn store() -> InMemoryCredentials {
        let hash = bcrypt::hash("correct", 4).expect("Failed to hash password");
        InMemoryCredentials::new().with_user("alice", hash)
    }

    #[test]
    fn test_hash_password_round_trip() {
        let hash = hash_password("ValidPassword123").expect("Failed to hash password");

        // Hash should not be the same as password
        assert_ne!(hash, "ValidPassword123");
        assert!(hash.starts_with("$2"));

        let store = InMemoryCredentials::from_settings(&[UserSettings {
            username: "alice".to_string(),
            password_hash: hash,
        }]);
        assert!(store.authenticate("alice", "ValidPassword123"));
        assert!(!store.authenticate("alice", "WrongPassword123"));
    }

    #[test]
    fn test_verify_password() {
        assert!(store().authenticate("alice", "correct"));
    }

    #[test]
    fn test_verify_wrong_password() {
        assert!(!store().authenticate("alice", "incorrect"));
    }

    #[test]
    fn test_unknown_user() {
        assert!(!store().authenticate("bob", "correct"));
    }

    #[test]
    fn test_corrupt_hash_is_a_failed_login() {
        let store = InMemoryCredentials::new().with_user("alice", "not-a-bcrypt-hash");
        assert!(!store.authenticate("alice", "correct"));
    }

    #[test]
    fn test_default_authorize_allows() {
        let ctx = RequestContext::new("GET", "/api/me");
        assert!(store().authorize("alice", &ctx));
    }

    #[test]
    fn test_from_settings() {
        let users = vec![
            UserSettings {
                username: "alice".to_string(),
                password_hash: bcrypt::hash("a", 4).unwrap(),
            },
            UserSettings {
                username: "bob".to_string(),
                password_hash: bcrypt::hash("b", 4).unwrap(),
            },
        ];
        let store = InMemoryCredentials::from_settings(&users);

        assert_eq!(store.len(), 2);
        assert!(store.authenticate("bob", "b"));
        assert!(!store.authenticate("bob", "a"));
    }
}
