//! User settings endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use sentinel_common::models::{Id, NewUserSettings, UserSettings, UserSettingsUpdate};
use sentinel_common::validation::Validate;
use sentinel_common::Error;
use tracing::{debug, info};

use crate::{ApiError, ApiResult, AppState};

/// GET /api/user-settings/:userId
///
/// A user without settings gets the defaults created and returned. The id is
/// checked first so a bad id never leaves a row behind.
pub async fn get_settings(
    State(state): State<AppState>,
    user_id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<UserSettings>> {
    let Path(user_id) = user_id?;
    let defaults = NewUserSettings::defaults_for(user_id);
    defaults.validate()?;

    if let Some(settings) = state.storage.get_user_settings(user_id).await? {
        return Ok(Json(settings));
    }

    match state.storage.create_user_settings(defaults).await {
        Ok(settings) => {
            info!(user_id, "Created default settings");
            Ok(Json(settings))
        }
        // Another request created them first
        Err(Error::Conflict(_)) => {
            debug!(user_id, "Default settings raced, re-reading");
            state
                .storage
                .get_user_settings(user_id)
                .await?
                .map(Json)
                .ok_or_else(|| {
                    ApiError::Internal(format!("Settings for user {} vanished", user_id))
                })
        }
        Err(e) => Err(e.into()),
    }
}

/// PUT /api/user-settings/:userId
pub async fn update_settings(
    State(state): State<AppState>,
    user_id: Result<Path<Id>, PathRejection>,
    payload: Result<Json<UserSettingsUpdate>, JsonRejection>,
) -> ApiResult<Json<UserSettings>> {
    let Path(user_id) = user_id?;
    let Json(update) = payload?;
    update.validate()?;

    state
        .storage
        .update_user_settings(user_id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Settings not found".to_string()))
}
