//! Token lifecycle
//!
//! [`JwtAuth`] holds the validated, read-only configuration and runs the
//! three flows built on top of the codec:
//! - login: check credentials, issue a token
//! - verify: check a bearer token before a protected handler runs
//! - refresh: re-issue a token without credentials, bounded by `orig_iat`
//!
//! Every flow has an `*_at` variant taking the current Unix time so the
//! temporal rules can be exercised deterministically.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::authenticator::{Authenticator, RequestContext};
use crate::auth::bearer::extract_bearer;
use crate::auth::claims::ClaimSet;
use crate::auth::jwt::{issue_token, parse_token, SigningAlgorithm};
use crate::configuration::JwtSettings;
use crate::error::{AuthError, AuthRejection, ConfigError, UnauthorizedReason};

const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
// Ten years. Keeps `now + duration` far from i64 overflow.
const MAX_DURATION_SECS: i64 = 10 * 365 * 24 * 3600;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Reply of the login and refresh endpoints
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

/// Identity of the caller once the gate has let a request through.
/// Stored in the request extensions, the `REMOTE_USER` of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.0
    }
}

pub struct JwtAuth {
    realm: String,
    algorithm: SigningAlgorithm,
    key: Vec<u8>,
    token_lifetime: i64,
    max_refresh: i64,
    authenticator: Arc<dyn Authenticator>,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth")
            .field("realm", &self.realm)
            .field("algorithm", &self.algorithm)
            .field("token_lifetime", &self.token_lifetime)
            .field("max_refresh", &self.max_refresh)
            .finish_non_exhaustive()
    }
}

impl JwtAuth {
    pub fn builder(settings: JwtSettings) -> JwtAuthBuilder {
        JwtAuthBuilder::new(settings)
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn token_lifetime(&self) -> i64 {
        self.token_lifetime
    }

    pub fn refresh_enabled(&self) -> bool {
        self.max_refresh != 0
    }

    /// Wrap an error into the uniform response for this realm
    pub fn reject(&self, error: AuthError) -> AuthRejection {
        AuthRejection::new(self.realm.clone(), error)
    }

    /// Decode claims from a token signed by this gate. Expiry is not checked.
    pub fn decode(&self, token: &str) -> Result<ClaimSet, AuthError> {
        Ok(parse_token(token, self.algorithm, &self.key)?)
    }

    // ========================================================================
    // Login
    // ========================================================================

    pub fn login(&self, body: &[u8]) -> Result<TokenResponse, AuthError> {
        self.login_at(body, now())
    }

    /// Authenticate the JSON credential pair in `body` and issue a token
    ///
    /// # Errors
    /// - `BadRequest` if the body is not `{"username","password"}` or the username is empty
    /// - `Unauthorized(InvalidCredentials)` if the authenticator refuses the pair
    /// - `Signing` if the token cannot be signed
    pub fn login_at(&self, body: &[u8], now: i64) -> Result<TokenResponse, AuthError> {
        let credentials: LoginRequest =
            serde_json::from_slice(body).map_err(|e| AuthError::BadRequest(e.to_string()))?;

        if credentials.username.is_empty() {
            return Err(AuthError::BadRequest("username is empty".to_string()));
        }

        if !self
            .authenticator
            .authenticate(&credentials.username, &credentials.password)
        {
            return Err(UnauthorizedReason::InvalidCredentials.into());
        }

        let claims = ClaimSet::new(
            &credentials.username,
            now,
            self.token_lifetime,
            self.refresh_enabled(),
        )?;
        let token = issue_token(&claims, self.algorithm, &self.key)?;

        tracing::info!(subject = %claims.id, exp = claims.exp, "Issued token");
        Ok(TokenResponse { token })
    }

    // ========================================================================
    // Verification
    // ========================================================================

    pub fn verify(
        &self,
        authorization: Option<&str>,
        request: &RequestContext,
    ) -> Result<AuthenticatedUser, AuthError> {
        self.verify_at(authorization, request, now())
    }

    /// Validate the bearer token of a request to a protected route
    ///
    /// # Errors
    /// `Unauthorized` for a missing or malformed header, a token that fails
    /// to verify, an expired token, or a subject refused by `authorize`
    pub fn verify_at(
        &self,
        authorization: Option<&str>,
        request: &RequestContext,
        now: i64,
    ) -> Result<AuthenticatedUser, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.decode(token)?;

        if claims.is_expired_at(now) {
            return Err(UnauthorizedReason::Expired.into());
        }

        if !self.authenticator.authorize(&claims.id, request) {
            return Err(UnauthorizedReason::Forbidden.into());
        }

        tracing::debug!(subject = %claims.id, path = %request.path, "JWT validated successfully");
        Ok(AuthenticatedUser(claims.id))
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    pub fn refresh(&self, authorization: Option<&str>) -> Result<TokenResponse, AuthError> {
        self.refresh_at(authorization, now())
    }

    /// Issue a new token for the lineage of the presented one
    ///
    /// `exp` of the presented token is not checked: an expired token stays
    /// refreshable until `orig_iat + max_refresh`.
    ///
    /// # Errors
    /// `Unauthorized` if the header or token is invalid, refresh is disabled,
    /// the token has no `orig_iat`, or the refresh window has elapsed
    pub fn refresh_at(
        &self,
        authorization: Option<&str>,
        now: i64,
    ) -> Result<TokenResponse, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.decode(token)?;

        if !self.refresh_enabled() {
            return Err(UnauthorizedReason::RefreshNotAllowed.into());
        }
        claims.ensure_refreshable_at(now, self.max_refresh)?;

        let renewed = claims.renewed(now, self.token_lifetime)?;
        let token = issue_token(&renewed, self.algorithm, &self.key)?;

        tracing::info!(subject = %renewed.id, exp = renewed.exp, "Refreshed token");
        Ok(TokenResponse { token })
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Validates [`JwtSettings`] and assembles a [`JwtAuth`]
pub struct JwtAuthBuilder {
    settings: JwtSettings,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl JwtAuthBuilder {
    fn new(settings: JwtSettings) -> Self {
        Self {
            settings,
            authenticator: None,
        }
    }

    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// # Errors
    /// - `MissingRequired` for an empty realm or secret, or no authenticator
    /// - `InvalidValue` for an unknown algorithm, or a duration that is
    ///   negative or longer than ten years
    pub fn build(self) -> Result<JwtAuth, ConfigError> {
        let settings = self.settings;

        if settings.realm.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.realm".to_string()));
        }
        if settings.secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        let authenticator = self
            .authenticator
            .ok_or_else(|| ConfigError::MissingRequired("authenticator".to_string()))?;

        let algorithm = match settings.signing_algorithm.as_deref() {
            None | Some("") => SigningAlgorithm::default(),
            Some(name) => name.parse::<SigningAlgorithm>().map_err(ConfigError::InvalidValue)?,
        };

        check_duration("jwt.token_lifetime_secs", settings.token_lifetime_secs)?;
        check_duration("jwt.max_refresh_secs", settings.max_refresh_secs)?;

        let token_lifetime = match settings.token_lifetime_secs {
            0 => DEFAULT_TOKEN_LIFETIME_SECS,
            secs => secs,
        };

        Ok(JwtAuth {
            realm: settings.realm,
            algorithm,
            key: settings.secret.into_bytes(),
            token_lifetime,
            max_refresh: settings.max_refresh_secs,
            authenticator,
        })
    }
}

fn check_duration(field: &str, secs: i64) -> Result<(), ConfigError> {
    if !(0..=MAX_DURATION_SECS).contains(&secs) {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between 0 and {} seconds, got {}",
            field, MAX_DURATION_SECS, secs
        )));
    }
    Ok(())
}
