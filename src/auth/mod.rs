//! Authentication module
//!
//! Token codec, claim set, credential backends and the login / verify /
//! refresh lifecycle built on them.

mod authenticator;
mod bearer;
mod claims;
mod gate;
mod jwt;

pub use authenticator::{hash_password, Authenticator, InMemoryCredentials, RequestContext};
pub use bearer::extract_bearer;
pub use claims::ClaimSet;
pub use gate::{AuthenticatedUser, JwtAuth, JwtAuthBuilder, LoginRequest, TokenResponse};
pub use jwt::{issue_token, parse_token, SigningAlgorithm};
