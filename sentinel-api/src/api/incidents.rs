//! Incident report endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use sentinel_common::models::{Id, Incident, NewIncident};
use sentinel_common::validation::Validate;
use serde::Deserialize;
use tracing::info;

use crate::{ApiResult, AppState};

/// Query parameters for GET /api/incidents
#[derive(Debug, Default, Deserialize)]
pub struct IncidentQuery {
    /// Maximum number of incidents (default 10, capped at 100)
    #[serde(default, deserialize_with = "deserialize_optional_limit")]
    pub limit: Option<u32>,
}

/// `?limit=` with no value means the default limit
fn deserialize_optional_limit<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid limit `{raw}`: {e}"))),
        _ => Ok(None),
    }
}

/// GET /api/incidents?limit=N
///
/// Most recent incidents first.
pub async fn list_incidents(
    State(state): State<AppState>,
    query: Result<Query<IncidentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Incident>>> {
    let Query(query) = query?;
    Ok(Json(state.storage.get_incidents(query.limit).await?))
}

/// GET /api/incidents/user/:userId
pub async fn list_user_incidents(
    State(state): State<AppState>,
    user_id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Vec<Incident>>> {
    let Path(user_id) = user_id?;
    Ok(Json(state.storage.get_incidents_by_user(user_id).await?))
}

/// POST /api/incidents
pub async fn create_incident(
    State(state): State<AppState>,
    payload: Result<Json<NewIncident>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Incident>)> {
    let Json(incident) = payload?;
    incident.validate()?;

    let incident = state.storage.create_incident(incident).await?;
    info!(
        incident_id = incident.id,
        anonymous = incident.is_anonymous,
        "Incident reported: {}",
        incident.kind
    );

    Ok((StatusCode::CREATED, Json(incident)))
}
