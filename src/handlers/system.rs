// handlers/system.rs - GET / and GET /health

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "name": "Estate Admin",
        "version": version,
        "store": state.config.store.backend.to_string(),
        "endpoints": {
            "properties": "/manage-properties (GET, POST, PUT, DELETE; admin credential)",
            "consultations": "/manage-consultations (GET, PUT, DELETE; admin credential)",
            "login": "/auth/login (POST, public - token acquisition)",
            "admin": "/admin, /admin/login, /admin/logout (browser pages)",
            "health": "/health"
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.health_check().await.map_err(|e| {
        tracing::warn!("Health check failed: {}", e);
        ApiError::service_unavailable("Store unavailable")
    })?;

    Ok(Json(json!({
        "success": true,
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "store": "ok"
    })))
}
