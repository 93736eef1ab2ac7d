/// Middleware module
///
/// Custom middleware guarding protected scopes.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
