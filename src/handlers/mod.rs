// handlers/mod.rs - route handlers
//
// CRUD endpoints (admin credential required):
//   /manage-properties     properties.rs
//   /manage-consultations  consultations.rs
// Public:
//   /admin/*               admin.rs (server-rendered login)
//   /auth/login            auth.rs (JSON login)
//   /, /health             system.rs

pub mod admin;
pub mod auth;
pub mod consultations;
pub mod properties;
pub mod system;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Body of a delete request
#[derive(Debug, Default, Deserialize)]
pub struct IdBody {
    pub id: Option<Value>,
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Uniqueness token for generated image URLs
pub(crate) fn image_seq() -> i64 {
    Utc::now().timestamp_millis()
}
