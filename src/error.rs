//! Error handling for the authentication gate
//!
//! Every request-time failure ends up as the same `401 Unauthorized`
//! response carrying a `WWW-Authenticate: Basic realm=<realm>` challenge.
//! The precise reason is only ever written to the logs.

use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

// ============================================================================
// 1. TOKEN CODEC ERRORS
// ============================================================================

/// Failures produced while decoding and verifying a token string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not three base64url segments, or header/claims are not the expected JSON
    Malformed,
    /// Recomputed signature does not match the embedded one
    InvalidSignature,
    /// Header names an algorithm other than the configured one
    UnsupportedAlgorithm,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::InvalidSignature => write!(f, "token signature mismatch"),
            TokenError::UnsupportedAlgorithm => write!(f, "token algorithm not accepted"),
        }
    }
}

impl StdError for TokenError {}

// ============================================================================
// 2. REQUEST-TIME AUTHENTICATION ERRORS
// ============================================================================

/// Why a request was turned away. Logged, never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    MissingHeader,
    InvalidHeader,
    Token(TokenError),
    Expired,
    InvalidCredentials,
    Forbidden,
    RefreshNotAllowed,
    RefreshWindowElapsed,
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnauthorizedReason::MissingHeader => write!(f, "authorization header missing"),
            UnauthorizedReason::InvalidHeader => write!(f, "authorization header is not a bearer token"),
            UnauthorizedReason::Token(e) => write!(f, "{}", e),
            UnauthorizedReason::Expired => write!(f, "token has expired"),
            UnauthorizedReason::InvalidCredentials => write!(f, "invalid credentials"),
            UnauthorizedReason::Forbidden => write!(f, "authorization callback refused subject"),
            UnauthorizedReason::RefreshNotAllowed => write!(f, "token is not refreshable"),
            UnauthorizedReason::RefreshWindowElapsed => write!(f, "refresh window has elapsed"),
        }
    }
}

/// Central error type of the login, verification and refresh flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The request payload could not be decoded
    BadRequest(String),
    Unauthorized(UnauthorizedReason),
    /// The signing backend failed. Unexpected; not caused by the caller.
    Signing(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AuthError::Unauthorized(reason) => write!(f, "Unauthorized: {}", reason),
            AuthError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
        }
    }
}

impl StdError for AuthError {}

impl From<UnauthorizedReason> for AuthError {
    fn from(reason: UnauthorizedReason) -> Self {
        AuthError::Unauthorized(reason)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Unauthorized(UnauthorizedReason::Token(err))
    }
}

// ============================================================================
// 3. STARTUP CONFIGURATION ERRORS
// ============================================================================

/// Raised while building the gate. Fatal for startup, never seen per request.
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    Load(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::Load(msg) => write!(f, "Config load error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

// ============================================================================
// 4. HTTP RESPONSE MAPPING
// ============================================================================

/// Body written for every rejected request
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "Error")]
    pub error: String,
}

/// An [`AuthError`] bound to the realm it is reported under
#[derive(Debug)]
pub struct AuthRejection {
    realm: String,
    error: AuthError,
}

impl AuthRejection {
    pub fn new(realm: impl Into<String>, error: AuthError) -> Self {
        Self {
            realm: realm.into(),
            error,
        }
    }

    pub fn challenge(&self) -> String {
        format!("Basic realm={}", self.realm)
    }

    fn log_error(&self, request_id: &str) {
        match &self.error {
            AuthError::Signing(msg) => {
                tracing::error!(
                    request_id = request_id,
                    error = %msg,
                    "Token signing failed"
                );
            }
            AuthError::BadRequest(msg) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %msg,
                    "Rejected malformed authentication payload"
                );
            }
            AuthError::Unauthorized(reason) => {
                tracing::warn!(
                    request_id = request_id,
                    reason = %reason,
                    "Authentication error"
                );
            }
        }
    }
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        match self.error {
            AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::BadRequest(_) | AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let status = self.status_code();
        if status == StatusCode::UNAUTHORIZED {
            HttpResponse::build(status)
                .insert_header((header::WWW_AUTHENTICATE, self.challenge()))
                .json(ErrorResponse {
                    error: "Not Authorized".to_string(),
                })
        } else {
            HttpResponse::build(status).json(ErrorResponse {
                error: "Internal Server Error".to_string(),
            })
        }
    }
}
