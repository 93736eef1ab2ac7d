/// Authentication Routes
///
/// Handles login, token refresh, and current user information.

use actix_web::{http::header::AUTHORIZATION, web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde::Serialize;

use crate::auth::{AuthenticatedUser, JwtAuth};
use crate::error::{AuthError, AuthRejection};

/// Upper bound on a login body; credentials never come close
const MAX_LOGIN_BODY_BYTES: usize = 16 * 1024;

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
}

/// POST /auth/login
///
/// Authenticate with `{"username": ..., "password": ...}`.
/// Returns `{"token": ...}` on success.
///
/// The body is read from the raw payload stream so that a payload that does
/// not decode, or is too large, is answered with the same 401 as a wrong
/// password.
///
/// # Errors
/// - 401: Malformed or oversized payload, or invalid credentials
/// - 500: Token signing failed
pub async fn login(
    payload: web::Payload,
    auth: web::Data<JwtAuth>,
) -> Result<HttpResponse, AuthRejection> {
    let body = read_login_body(payload).await.map_err(|e| auth.reject(e))?;
    let response = auth.login(&body).map_err(|e| auth.reject(e))?;
    Ok(HttpResponse::Ok().json(response))
}

/// Collect the request body up to `MAX_LOGIN_BODY_BYTES`.
/// The rest of the stream is drained so the connection stays usable.
async fn read_login_body(mut payload: web::Payload) -> Result<web::BytesMut, AuthError> {
    let mut body = web::BytesMut::new();
    let mut overflow = false;

    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AuthError::BadRequest(format!("failed to read body: {}", e)))?;
        if overflow || body.len() + chunk.len() > MAX_LOGIN_BODY_BYTES {
            overflow = true;
            continue;
        }
        body.extend_from_slice(&chunk);
    }

    if overflow {
        return Err(AuthError::BadRequest("login body too large".to_string()));
    }

    Ok(body)
}

/// GET|POST /auth/refresh_token
///
/// Exchange a still-refreshable token, presented as
/// `Authorization: Bearer <token>`, for a new one.
/// The token may already be expired as long as its lineage is within the
/// configured refresh window.
///
/// # Errors
/// - 401: Missing/invalid token, refresh disabled, or refresh window elapsed
/// - 500: Token signing failed
pub async fn refresh_token(
    req: HttpRequest,
    auth: web::Data<JwtAuth>,
) -> Result<HttpResponse, AuthRejection> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let response = auth.refresh(authorization).map_err(|e| auth.reject(e))?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/me
///
/// Get the authenticated subject.
/// **Requires valid JWT access token** in Authorization header; the
/// subject is injected by the JWT middleware.
pub async fn get_current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse {
        id: user.into_inner().0,
    })
}
