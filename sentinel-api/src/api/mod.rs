//! HTTP API handlers for sentinel-api

pub mod buildinfo;
pub mod contacts;
pub mod guardian;
pub mod health;
pub mod incidents;
pub mod safe_zones;
pub mod settings;
pub mod sos;

pub use buildinfo::get_build_info;
pub use contacts::{create_contact, delete_contact, list_contacts, update_contact};
pub use guardian::{
    create_guardian_alert, create_guardian_session, list_guardian_alerts,
    list_guardian_sessions, resolve_guardian_alert, update_guardian_session,
};
pub use health::health_routes;
pub use incidents::{create_incident, list_incidents, list_user_incidents};
pub use safe_zones::list_safe_zones;
pub use settings::{get_settings, update_settings};
pub use sos::{create_sos_alert, list_sos_alerts, update_sos_status};

use crate::ApiError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("No such endpoint".to_string())
}
