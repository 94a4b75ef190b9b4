//! Emergency contact endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use sentinel_common::models::{
    EmergencyContact, EmergencyContactUpdate, Id, NewEmergencyContact,
};
use sentinel_common::validation::Validate;
use serde::Serialize;
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

/// Body of a successful delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// GET /api/emergency-contacts/:userId
pub async fn list_contacts(
    State(state): State<AppState>,
    user_id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Vec<EmergencyContact>>> {
    let Path(user_id) = user_id?;
    Ok(Json(state.storage.get_emergency_contacts(user_id).await?))
}

/// POST /api/emergency-contacts
pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<NewEmergencyContact>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EmergencyContact>)> {
    let Json(contact) = payload?;
    contact.validate()?;

    let contact = state.storage.create_emergency_contact(contact).await?;
    info!(
        contact_id = contact.id,
        user_id = contact.user_id,
        "Emergency contact added"
    );

    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/emergency-contacts/:id
pub async fn update_contact(
    State(state): State<AppState>,
    id: Result<Path<Id>, PathRejection>,
    payload: Result<Json<EmergencyContactUpdate>, JsonRejection>,
) -> ApiResult<Json<EmergencyContact>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    update.validate()?;

    state
        .storage
        .update_emergency_contact(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Contact not found".to_string()))
}

/// DELETE /api/emergency-contacts/:id
pub async fn delete_contact(
    State(state): State<AppState>,
    id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<DeleteResponse>> {
    let Path(id) = id?;

    if !state.storage.delete_emergency_contact(id).await? {
        return Err(ApiError::NotFound("Contact not found".to_string()));
    }

    info!(contact_id = id, "Emergency contact removed");
    Ok(Json(DeleteResponse { success: true }))
}
