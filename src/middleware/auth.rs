use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::fmt;
use tracing::warn;

use crate::auth::{get_cookie_value, verify_token, Claims, SESSION_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

/// Who is calling a CRUD endpoint
#[derive(Clone, Debug)]
pub enum AdminIdentity {
    /// Holder of the store's service credential
    ServiceKey,
    /// Signed-in admin (session cookie or Bearer token)
    Session(Claims),
}

impl fmt::Display for AdminIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminIdentity::ServiceKey => f.write_str("service key"),
            AdminIdentity::Session(claims) if claims.demo => write!(f, "{} (demo)", claims.email),
            AdminIdentity::Session(claims) => f.write_str(&claims.email),
        }
    }
}

/// Admin authentication middleware. Accepts the service key or a session
/// token as `Authorization: Bearer`, or the session cookie. OPTIONS never
/// reaches here; the CORS layer answers it.
pub async fn require_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = identify(&state, &headers).map_err(|msg| {
        warn!("Rejected {} {}: {}", request.method(), request.uri().path(), msg);
        ApiError::unauthorized(msg)
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn identify(state: &AppState, headers: &HeaderMap) -> Result<AdminIdentity, String> {
    if let Some(token) = extract_bearer(headers)? {
        let service_key = state.config.store.service_key.as_deref();
        if service_key == Some(token) {
            return Ok(AdminIdentity::ServiceKey);
        }
        return verify_token(token, &state.config.security)
            .map(AdminIdentity::Session)
            .map_err(|e| e.to_string());
    }

    let token = get_cookie_value(headers, SESSION_COOKIE)
        .ok_or_else(|| "Missing Authorization header".to_string())?;
    verify_token(token, &state.config.security)
        .map(AdminIdentity::Session)
        .map_err(|e| e.to_string())
}

/// Bearer token from the Authorization header, if one was sent
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, String> {
    let Some(auth_header) = headers.get("authorization") else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty bearer token".to_string()),
        Some(token) => Ok(Some(token.trim())),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
