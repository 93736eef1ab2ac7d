//! JWT Claims structure
//!
//! The payload carried inside every issued token: who the subject is,
//! when the token stops being valid and, for refreshable tokens, when
//! its lineage was first issued.

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, UnauthorizedReason};

/// Claims embedded in an access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    /// Subject (the authenticated username)
    pub id: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issue time of the first token in this lineage (Unix timestamp).
    /// Only present when refresh is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_iat: Option<i64>,
}

impl ClaimSet {
    /// Create claims for a freshly authenticated subject
    ///
    /// # Arguments
    /// * `subject` - Identity that passed authentication
    /// * `now` - Issue time (Unix timestamp)
    /// * `lifetime_seconds` - Token lifetime
    /// * `refreshable` - Whether to stamp `orig_iat`
    ///
    /// # Errors
    /// - `BadRequest` if the subject is empty
    /// - `Signing` if `now + lifetime_seconds` does not fit a timestamp
    pub fn new(
        subject: &str,
        now: i64,
        lifetime_seconds: i64,
        refreshable: bool,
    ) -> Result<Self, AuthError> {
        if subject.is_empty() {
            return Err(AuthError::BadRequest("subject is empty".to_string()));
        }

        Ok(Self {
            id: subject.to_string(),
            exp: expiry(now, lifetime_seconds)?,
            orig_iat: refreshable.then_some(now),
        })
    }

    /// Claims for the next token of the same lineage.
    /// `id` and `orig_iat` are carried over untouched.
    pub fn renewed(&self, now: i64, lifetime_seconds: i64) -> Result<Self, AuthError> {
        Ok(Self {
            id: self.id.clone(),
            exp: expiry(now, lifetime_seconds)?,
            orig_iat: self.orig_iat,
        })
    }

    /// A token is valid only while `exp` is strictly in the future
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// Check that the lineage may still be renewed at `now`
    ///
    /// # Errors
    /// - `RefreshNotAllowed` if the token carries no `orig_iat`
    /// - `RefreshWindowElapsed` once `orig_iat + max_refresh_seconds <= now`
    pub fn ensure_refreshable_at(
        &self,
        now: i64,
        max_refresh_seconds: i64,
    ) -> Result<(), UnauthorizedReason> {
        let orig_iat = self.orig_iat.ok_or(UnauthorizedReason::RefreshNotAllowed)?;

        if orig_iat.saturating_add(max_refresh_seconds) > now {
            Ok(())
        } else {
            Err(UnauthorizedReason::RefreshWindowElapsed)
        }
    }
}

fn expiry(now: i64, lifetime_seconds: i64) -> Result<i64, AuthError> {
    now.checked_add(lifetime_seconds)
        .ok_or_else(|| AuthError::Signing("token expiry overflows a Unix timestamp".to_string()))
}
