//! Repository abstraction over the safety tables
//!
//! `Storage` is the single seam between HTTP handlers and persistence. Two
//! implementations ship:
//! - [`MemStorage`]: process-local maps, for tests and demos
//! - [`SqliteStorage`]: the persistent backend
//!
//! Both must agree on every observable behaviour: id assignment (1, 2, 3...
//! per entity, never reused), list ordering, defaulting and conflict rules.
//! Payloads are expected to be validated by the caller.

mod memory;
mod sqlite;

pub use memory::MemStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};

use crate::models::*;
use crate::Result;

/// Number of incidents returned when the caller gives no limit
pub const DEFAULT_INCIDENT_LIMIT: u32 = 10;

/// Upper bound on a single incident listing
pub const MAX_INCIDENT_LIMIT: u32 = 100;

/// Clamp a requested incident limit into `1..=MAX_INCIDENT_LIMIT`
pub fn effective_incident_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(DEFAULT_INCIDENT_LIMIT)
        .clamp(1, MAX_INCIDENT_LIMIT)
}

/// Current time at the precision the SQLite backend keeps (microseconds)
pub(crate) fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    // Users
    async fn get_user(&self, id: Id) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Fails with `Error::Conflict` when the username is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    // Emergency contacts
    async fn get_emergency_contacts(&self, user_id: Id) -> Result<Vec<EmergencyContact>>;
    async fn create_emergency_contact(&self, contact: NewEmergencyContact)
        -> Result<EmergencyContact>;
    async fn update_emergency_contact(
        &self,
        id: Id,
        update: EmergencyContactUpdate,
    ) -> Result<Option<EmergencyContact>>;
    /// Returns whether a contact was removed
    async fn delete_emergency_contact(&self, id: Id) -> Result<bool>;

    // Incidents
    /// Newest (highest id) first; see [`effective_incident_limit`]
    async fn get_incidents(&self, limit: Option<u32>) -> Result<Vec<Incident>>;
    async fn get_incidents_by_user(&self, user_id: Id) -> Result<Vec<Incident>>;
    async fn create_incident(&self, incident: NewIncident) -> Result<Incident>;

    // SOS alerts
    async fn get_sos_alerts(&self, user_id: Id) -> Result<Vec<SosAlert>>;
    async fn create_sos_alert(&self, alert: NewSosAlert) -> Result<SosAlert>;
    async fn update_sos_alert_status(&self, id: Id, status: SosStatus)
        -> Result<Option<SosAlert>>;

    // Safe zones (inactive zones are never listed)
    async fn get_safe_zones(&self) -> Result<Vec<SafeZone>>;
    async fn get_safe_zones_by_type(&self, kind: &str) -> Result<Vec<SafeZone>>;
    async fn create_safe_zone(&self, zone: NewSafeZone) -> Result<SafeZone>;
    /// Total zones including inactive ones; used by seeding
    async fn count_safe_zones(&self) -> Result<u64>;

    // User settings
    async fn get_user_settings(&self, user_id: Id) -> Result<Option<UserSettings>>;
    /// Fails with `Error::Conflict` when the user already has settings
    async fn create_user_settings(&self, settings: NewUserSettings) -> Result<UserSettings>;
    async fn update_user_settings(
        &self,
        user_id: Id,
        update: UserSettingsUpdate,
    ) -> Result<Option<UserSettings>>;

    // Guardian sessions
    async fn create_guardian_session(&self, session: NewGuardianSession)
        -> Result<GuardianSession>;
    async fn get_guardian_session(&self, id: Id) -> Result<Option<GuardianSession>>;
    async fn get_guardian_sessions(&self, user_id: Id) -> Result<Vec<GuardianSession>>;
    async fn update_guardian_session(
        &self,
        id: Id,
        update: GuardianSessionUpdate,
    ) -> Result<Option<GuardianSession>>;

    // Guardian alerts
    async fn create_guardian_alert(&self, alert: NewGuardianAlert) -> Result<GuardianAlert>;
    async fn get_guardian_alerts(&self, user_id: Id) -> Result<Vec<GuardianAlert>>;
    async fn resolve_guardian_alert(&self, id: Id) -> Result<Option<GuardianAlert>>;
}
