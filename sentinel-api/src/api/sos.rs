//! SOS alert endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use sentinel_common::models::{Id, NewSosAlert, SosAlert, SosStatus};
use sentinel_common::validation::Validate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{ApiError, ApiResult, AppState};

pub const SOS_SENT_MESSAGE: &str = "SOS alert sent successfully to emergency contacts";

/// Created alert plus delivery summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAlertCreated {
    #[serde(flatten)]
    pub alert: SosAlert,
    pub message: String,
    pub contacts_notified: usize,
}

/// Body of PATCH /api/sos-alerts/:id/status
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// GET /api/sos-alerts/:userId
pub async fn list_sos_alerts(
    State(state): State<AppState>,
    user_id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Vec<SosAlert>>> {
    let Path(user_id) = user_id?;
    Ok(Json(state.storage.get_sos_alerts(user_id).await?))
}

/// POST /api/sos-alerts
///
/// Stores the alert, then notifies the user's emergency contacts. Once the
/// alert is stored the request succeeds even if notification does not.
pub async fn create_sos_alert(
    State(state): State<AppState>,
    payload: Result<Json<NewSosAlert>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SosAlertCreated>)> {
    let Json(alert) = payload?;
    alert.validate()?;

    let alert = state.storage.create_sos_alert(alert).await?;
    warn!(
        alert_id = alert.id,
        user_id = alert.user_id,
        "SOS alert raised at {}",
        alert.location
    );

    let contacts = match state.storage.get_emergency_contacts(alert.user_id).await {
        Ok(contacts) => contacts,
        Err(e) => {
            warn!(alert_id = alert.id, "Could not load emergency contacts: {}", e);
            Vec::new()
        }
    };

    let contacts_notified = match state.notifier.notify(&alert, &contacts).await {
        Ok(count) => count,
        Err(e) => {
            warn!(alert_id = alert.id, "{}", e);
            0
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(SosAlertCreated {
            alert,
            message: SOS_SENT_MESSAGE.to_string(),
            contacts_notified,
        }),
    ))
}

/// PATCH /api/sos-alerts/:id/status
pub async fn update_sos_status(
    State(state): State<AppState>,
    id: Result<Path<Id>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<SosAlert>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    let status: SosStatus = update.status.trim().parse()?;

    let alert = state
        .storage
        .update_sos_alert_status(id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("SOS alert not found".to_string()))?;

    info!(alert_id = id, "SOS alert marked {}", status);
    Ok(Json(alert))
}
