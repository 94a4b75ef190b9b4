//! Safe zone lookup

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use sentinel_common::models::SafeZone;
use serde::Deserialize;

use crate::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SafeZoneQuery {
    /// police, hospital or ngo
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /api/safe-zones?type=T
///
/// Active zones only. An empty `type` is the same as no filter.
pub async fn list_safe_zones(
    State(state): State<AppState>,
    query: Result<Query<SafeZoneQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SafeZone>>> {
    let Query(query) = query?;

    let zones = match query.kind.as_deref().map(str::trim) {
        Some(kind) if !kind.is_empty() => state.storage.get_safe_zones_by_type(kind).await?,
        _ => state.storage.get_safe_zones().await?,
    };

    Ok(Json(zones))
}
