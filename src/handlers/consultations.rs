// handlers/consultations.rs - /manage-consultations
//
// Consultations are created by the public site; the back office only lists
// them, moves them through statuses and deletes them.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::IdBody;
use crate::database::models::RecordId;
use crate::error::ApiError;
use crate::middleware::{AdminIdentity, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub id: Option<Value>,
    pub status: Option<Value>,
}

pub async fn list_consultations(State(state): State<AppState>) -> ApiResult {
    let consultations = state
        .store
        .list_consultations()
        .await
        .map_err(|e| ApiError::store("Failed to fetch consultations", &e))?;

    info!("Fetched {} consultations", consultations.len());
    Ok(ApiResponse::success().with_data("consultations", consultations))
}

/// PUT - change `status` only; every other column is left as stored
pub async fn update_consultation(
    State(state): State<AppState>,
    Extension(caller): Extension<AdminIdentity>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let id = body
        .id
        .as_ref()
        .and_then(RecordId::from_value)
        .ok_or_else(|| ApiError::bad_request("Consultation ID is required"))?;
    let status = body
        .status
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Consultation status is required"))?;

    let consultation = state
        .store
        .update_consultation_status(&id, status)
        .await
        .map_err(|e| ApiError::store("Failed to update consultation", &e))?
        .ok_or_else(|| {
            warn!("Consultation {} not found", id);
            ApiError::not_found("Consultation not found")
        })?;

    info!("{} moved consultation {} to {}", caller, id, status);
    Ok(ApiResponse::success().with_data("consultation", consultation))
}

/// DELETE - succeeds whether or not a row matched
pub async fn delete_consultation(
    State(state): State<AppState>,
    Extension(caller): Extension<AdminIdentity>,
    body: Result<Json<IdBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let id = body
        .id
        .as_ref()
        .and_then(RecordId::from_value)
        .ok_or_else(|| ApiError::bad_request("Consultation ID is required"))?;

    let removed = state
        .store
        .delete_consultation(&id)
        .await
        .map_err(|e| ApiError::store("Failed to delete consultation", &e))?;

    if removed {
        info!("{} deleted consultation {}", caller, id);
    } else {
        info!("Consultation {} was already gone", id);
    }
    Ok(ApiResponse::success())
}
