//! Guardian session and guardian alert records
//!
//! Monitoring itself runs on the client; the service only keeps the records.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use sentinel_common::models::{
    GuardianAlert, GuardianSession, GuardianSessionUpdate, Id, NewGuardianAlert,
    NewGuardianSession,
};
use sentinel_common::validation::Validate;
use tracing::{info, warn};

use crate::{ApiError, ApiResult, AppState};

/// POST /api/guardian-sessions
pub async fn create_guardian_session(
    State(state): State<AppState>,
    payload: Result<Json<NewGuardianSession>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GuardianSession>)> {
    let Json(session) = payload?;
    session.validate()?;

    let session = state.storage.create_guardian_session(session).await?;
    info!(
        session_id = session.id,
        user_id = session.user_id,
        "Guardian session started: {}",
        session.session_type
    );

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/guardian-sessions/user/:userId
pub async fn list_guardian_sessions(
    State(state): State<AppState>,
    user_id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Vec<GuardianSession>>> {
    let Path(user_id) = user_id?;
    Ok(Json(state.storage.get_guardian_sessions(user_id).await?))
}

/// PATCH /api/guardian-sessions/:id
pub async fn update_guardian_session(
    State(state): State<AppState>,
    id: Result<Path<Id>, PathRejection>,
    payload: Result<Json<GuardianSessionUpdate>, JsonRejection>,
) -> ApiResult<Json<GuardianSession>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    update.validate()?;

    let session = state
        .storage
        .update_guardian_session(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Guardian session not found".to_string()))?;

    if !session.is_active {
        info!(session_id = id, "Guardian session ended");
    }
    Ok(Json(session))
}

/// POST /api/guardian-alerts
pub async fn create_guardian_alert(
    State(state): State<AppState>,
    payload: Result<Json<NewGuardianAlert>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GuardianAlert>)> {
    let Json(alert) = payload?;
    alert.validate()?;

    let alert = state.storage.create_guardian_alert(alert).await?;
    warn!(
        alert_id = alert.id,
        user_id = alert.user_id,
        confidence = alert.confidence,
        "Guardian alert: {}",
        alert.trigger_type
    );

    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /api/guardian-alerts/:userId
pub async fn list_guardian_alerts(
    State(state): State<AppState>,
    user_id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Vec<GuardianAlert>>> {
    let Path(user_id) = user_id?;
    Ok(Json(state.storage.get_guardian_alerts(user_id).await?))
}

/// PATCH /api/guardian-alerts/:id/resolve
pub async fn resolve_guardian_alert(
    State(state): State<AppState>,
    id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<GuardianAlert>> {
    let Path(id) = id?;

    state
        .storage
        .resolve_guardian_alert(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Guardian alert not found".to_string()))
}
