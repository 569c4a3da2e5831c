// handlers/properties.rs - /manage-properties
//
// GET lists, POST creates, PUT merges into an existing row, DELETE removes.
// Bodies are the loosely-typed dashboard form (see `PropertyInput`).

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use tracing::{info, warn};

use super::{image_seq, IdBody};
use crate::database::models::RecordId;
use crate::error::ApiError;
use crate::listing::{draft_for_create, draft_for_update, PropertyInput};
use crate::middleware::{AdminIdentity, ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /manage-properties - every property, newest first
pub async fn list_properties(State(state): State<AppState>) -> ApiResult {
    let properties = state
        .store
        .list_properties()
        .await
        .map_err(|e| ApiError::store("Failed to fetch properties", &e))?;

    info!("Fetched {} properties", properties.len());
    Ok(ApiResponse::success().with_data("properties", properties))
}

/// POST /manage-properties - validate, normalize, attach an image, insert
pub async fn create_property(
    State(state): State<AppState>,
    Extension(caller): Extension<AdminIdentity>,
    body: Result<Json<PropertyInput>, JsonRejection>,
) -> ApiResult {
    let Json(input) = body?;

    let draft = draft_for_create(&input, image_seq()).map_err(|missing| {
        warn!("Rejected property create: {}", missing);
        ApiError::from(missing)
    })?;

    let property = state
        .store
        .insert_property(&draft)
        .await
        .map_err(|e| ApiError::store("Failed to add property to database", &e))?;

    info!("{} added property {} ({})", caller, property.id, property.title);
    Ok(ApiResponse::success()
        .with_message("Property added successfully")
        .with_data("property", property))
}

/// PUT /manage-properties - merge the body over the stored row
pub async fn update_property(
    State(state): State<AppState>,
    Extension(caller): Extension<AdminIdentity>,
    body: Result<Json<PropertyInput>, JsonRejection>,
) -> ApiResult {
    let Json(input) = body?;
    let id = input
        .id
        .as_ref()
        .and_then(RecordId::from_value)
        .ok_or_else(|| ApiError::bad_request("Property ID is required for update"))?;

    let existing = state
        .store
        .find_property(&id)
        .await
        .map_err(|e| ApiError::store("Failed to load property", &e))?
        .ok_or_else(|| not_found(&id))?;

    let draft = draft_for_update(&input, &existing, image_seq());
    if draft.image_url.is_some() {
        info!("Generating new image for property {}", id);
    }

    // Conditional on the row still existing; a concurrent delete lands here as None
    let property = state
        .store
        .update_property(&id, &draft)
        .await
        .map_err(|e| ApiError::store("Failed to update property in database", &e))?
        .ok_or_else(|| not_found(&id))?;

    info!("{} updated property {} ({})", caller, property.id, property.title);
    Ok(ApiResponse::success()
        .with_message("Property updated successfully")
        .with_data("property", property))
}

/// DELETE /manage-properties - remove and echo the removed row
pub async fn delete_property(
    State(state): State<AppState>,
    Extension(caller): Extension<AdminIdentity>,
    body: Result<Json<IdBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let id = body
        .id
        .as_ref()
        .and_then(RecordId::from_value)
        .ok_or_else(|| ApiError::bad_request("Property ID is required for deletion"))?;

    let removed = state
        .store
        .delete_property(&id)
        .await
        .map_err(|e| ApiError::store("Failed to delete property from database", &e))?
        .ok_or_else(|| not_found(&id))?;

    info!("{} deleted property {} ({})", caller, removed.id, removed.title);
    Ok(ApiResponse::success()
        .with_message("Property deleted successfully")
        .with_data("deletedProperty", removed))
}

fn not_found(id: &RecordId) -> ApiError {
    warn!("Property {} not found", id);
    ApiError::not_found("Property not found")
}
