// handlers/auth.rs - POST /auth/login
//
// JSON counterpart of the admin login form. The returned token is accepted
// by the CRUD endpoints as `Authorization: Bearer <token>`.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::auth::{authenticate, issue_token, AuthError, Claims};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult {
    let Json(credentials) = body?;
    let config = &state.config;

    let outcome = authenticate(
        state.auth.as_ref(),
        config.admin.demo_login.as_ref(),
        &credentials.email,
        &credentials.password,
    )
    .await
    .map_err(|_| ApiError::unauthorized("Invalid credentials"))?;

    let claims = Claims::new(&outcome.user, outcome.demo, config.security.session_expiry_hours);
    let token = issue_token(&claims, &config.security).map_err(token_error)?;

    Ok(ApiResponse::success()
        .with_data("token", token)
        .with_data("expires_in", config.security.session_expiry_hours * 3600)
        .with_data("user", outcome.user))
}

pub(crate) fn token_error(err: AuthError) -> ApiError {
    tracing::error!("Failed to issue session token: {}", err);
    ApiError::internal_server_error("Failed to create session")
}
