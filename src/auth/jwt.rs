//! JWT Token Generation and Validation
//!
//! Signs claim sets into `header.claims.signature` strings and verifies
//! them again. The verifier only ever accepts the one configured HMAC
//! algorithm, whatever the token header says.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use std::str::FromStr;

use crate::auth::claims::ClaimSet;
use crate::error::{AuthError, TokenError};

/// Supported HMAC signing algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl SigningAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
            SigningAlgorithm::HS384 => "HS384",
            SigningAlgorithm::HS512 => "HS512",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(SigningAlgorithm::HS256),
            "HS384" => Ok(SigningAlgorithm::HS384),
            "HS512" => Ok(SigningAlgorithm::HS512),
            other => Err(format!("unsupported signing algorithm '{}'", other)),
        }
    }
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Sign a claim set into a token string
///
/// # Arguments
/// * `claims` - Payload to embed
/// * `algorithm` - HMAC variant, written to the `alg` header
/// * `key` - Shared secret
///
/// # Errors
/// Returns `Signing` if the signing backend fails
pub fn issue_token(
    claims: &ClaimSet,
    algorithm: SigningAlgorithm,
    key: &[u8],
) -> Result<String, AuthError> {
    encode(
        &Header::new(algorithm.into()),
        claims,
        &EncodingKey::from_secret(key),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Verify a token's signature and decode its claims
///
/// Expiry is deliberately left to the caller so that expired tokens can
/// still be parsed by the refresh flow.
///
/// # Errors
/// - `Malformed` if the token is not three base64url JSON segments or a
///   required claim is missing or mistyped
/// - `UnsupportedAlgorithm` if the header names a different algorithm
/// - `InvalidSignature` if the signature does not match `key`
pub fn parse_token(
    token: &str,
    algorithm: SigningAlgorithm,
    key: &[u8],
) -> Result<ClaimSet, TokenError> {
    let mut validation = Validation::new(algorithm.into());
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<ClaimSet>(token, &DecodingKey::from_secret(key), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("JWT validation error: {}", e);
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
                _ => TokenError::Malformed,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-secret-key-at-least-32-characters-long";
    const NOW: i64 = 1_700_000_000;

    fn sample_claims() -> ClaimSet {
        ClaimSet::new("alice", NOW, 3600, true).unwrap()
    }

    #[test]
    fn test_generate_and_validate_token() {
        let token = issue_token(&sample_claims(), SigningAlgorithm::HS256, KEY)
            .expect("Failed to generate token");

        assert_eq!(token.split('.').count(), 3);

        let claims = parse_token(&token, SigningAlgorithm::HS256, KEY)
            .expect("Failed to validate token");
        assert_eq!(claims, sample_claims());
    }

    #[test]
    fn test_header_names_algorithm_and_type() {
        let token = issue_token(&sample_claims(), SigningAlgorithm::HS384, KEY).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();

        assert_eq!(header.alg, Algorithm::HS384);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_expired_token_still_parses() {
        let claims = ClaimSet::new("alice", 1_000, 10, true).unwrap();
        let token = issue_token(&claims, SigningAlgorithm::HS256, KEY).unwrap();

        assert_eq!(parse_token(&token, SigningAlgorithm::HS256, KEY), Ok(claims));
    }

    #[test]
    fn test_wrong_key() {
        let token = issue_token(&sample_claims(), SigningAlgorithm::HS256, KEY).unwrap();
        let result = parse_token(&token, SigningAlgorithm::HS256, b"another-secret");

        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_algorithm_is_pinned() {
        let token = issue_token(&sample_claims(), SigningAlgorithm::HS512, KEY).unwrap();
        let result = parse_token(&token, SigningAlgorithm::HS256, KEY);

        assert_eq!(result, Err(TokenError::UnsupportedAlgorithm));
    }

    #[test]
    fn test_invalid_token() {
        for garbage in ["", "invalid", "invalid.token", "invalid.token.here", "a.b.c.d"] {
            let result = parse_token(garbage, SigningAlgorithm::HS256, KEY);
            assert_eq!(result, Err(TokenError::Malformed), "for {:?}", garbage);
        }
    }

    #[test]
    fn test_tampered_claims_segment() {
        let token = issue_token(&sample_claims(), SigningAlgorithm::HS256, KEY).unwrap();
        let segments: Vec<&str> = token.split('.').collect();
        let payload = segments[1];

        for position in 0..payload.len() {
            let mut bytes = payload.as_bytes().to_vec();
            bytes[position] = if bytes[position] == b'A' { b'B' } else { b'A' };
            let tampered_payload = String::from_utf8(bytes).unwrap();
            let tampered = format!("{}.{}.{}", segments[0], tampered_payload, segments[2]);

            let result = parse_token(&tampered, SigningAlgorithm::HS256, KEY);
            assert!(
                matches!(
                    result,
                    Err(TokenError::InvalidSignature) | Err(TokenError::Malformed)
                ),
                "tampering byte {} was accepted",
                position
            );
        }
    }

    #[test]
    fn test_appended_garbage_is_rejected() {
        let token = issue_token(&sample_claims(), SigningAlgorithm::HS256, KEY).unwrap();
        let tampered = format!("{}X", token);

        assert!(parse_token(&tampered, SigningAlgorithm::HS256, KEY).is_err());
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("HS512".parse::<SigningAlgorithm>(), Ok(SigningAlgorithm::HS512));
        assert!("hs256".parse::<SigningAlgorithm>().is_err());
        assert!("RS256".parse::<SigningAlgorithm>().is_err());
        assert_eq!(SigningAlgorithm::default(), SigningAlgorithm::HS256);
    }
}
