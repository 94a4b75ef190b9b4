//! sentinel-api library - HTTP service for the Sentinel safety app
//!
//! JSON REST endpoints over a [`Storage`] backend. The router is built here so
//! integration tests can drive it without binding a socket.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use sentinel_common::Storage;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod notify;

pub use error::{ApiError, ApiResult};
use notify::{ContactNotifier, TracingNotifier};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (in-memory or SQLite)
    pub storage: Arc<dyn Storage>,
    /// Emergency contact notification for SOS alerts
    pub notifier: Arc<dyn ContactNotifier>,
    /// When the service started, for health uptime
    pub startup_time: Instant,
}

impl AppState {
    /// Create state that logs SOS notifications
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            notifier: Arc::new(TracingNotifier),
            startup_time: Instant::now(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ContactNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, patch, post};

    let api = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        // Emergency contacts: GET takes the owner's user id, PUT/DELETE a contact id
        .route("/api/emergency-contacts", post(api::create_contact))
        .route(
            "/api/emergency-contacts/:id",
            get(api::list_contacts)
                .put(api::update_contact)
                .delete(api::delete_contact),
        )
        // Incidents
        .route(
            "/api/incidents",
            get(api::list_incidents).post(api::create_incident),
        )
        .route("/api/incidents/user/:user_id", get(api::list_user_incidents))
        // SOS alerts: GET takes a user id, PATCH an alert id
        .route("/api/sos-alerts", post(api::create_sos_alert))
        .route("/api/sos-alerts/:id", get(api::list_sos_alerts))
        .route("/api/sos-alerts/:id/status", patch(api::update_sos_status))
        // Safe zones
        .route("/api/safe-zones", get(api::list_safe_zones))
        // User settings
        .route(
            "/api/user-settings/:user_id",
            get(api::get_settings).put(api::update_settings),
        )
        // Guardian sessions and alerts
        .route("/api/guardian-sessions", post(api::create_guardian_session))
        .route(
            "/api/guardian-sessions/user/:user_id",
            get(api::list_guardian_sessions),
        )
        .route(
            "/api/guardian-sessions/:id",
            patch(api::update_guardian_session),
        )
        .route("/api/guardian-alerts", post(api::create_guardian_alert))
        .route("/api/guardian-alerts/:id", get(api::list_guardian_alerts))
        .route(
            "/api/guardian-alerts/:id/resolve",
            patch(api::resolve_guardian_alert),
        );

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
