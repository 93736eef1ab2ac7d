//! Bearer credential extraction from the `Authorization` header

use crate::error::UnauthorizedReason;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization: Bearer <token>` header value.
///
/// The scheme is case-sensitive and must be followed by exactly one space.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, UnauthorizedReason> {
    let value = match header {
        None | Some("") => return Err(UnauthorizedReason::MissingHeader),
        Some(value) => value,
    };

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() && !token.starts_with(' ') => Ok(token),
        _ => Err(UnauthorizedReason::InvalidHeader),
    }
}
