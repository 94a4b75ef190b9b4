//! Entity models and request payloads
//!
//! Every entity has a stored form (with store-assigned `id` and timestamps), an
//! insert payload (`New*`) and, where the API allows edits, a partial update
//! payload whose absent fields leave the stored value untouched.
//!
//! All types serialize with camelCase field names to match the web client.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, FieldError};

/// Store-assigned row identifier
pub type Id = i64;

fn default_true() -> bool {
    true
}

fn default_incident_status() -> String {
    "reported".to_string()
}

fn default_language() -> String {
    "english".to_string()
}

// ========================================
// Users
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    /// Never sent back over the wire
    #[serde(skip_serializing)]
    pub password: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

// ========================================
// Emergency contacts
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    pub phone: String,
    pub relationship: Option<String>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmergencyContact {
    pub user_id: Id,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl NewEmergencyContact {
    pub fn into_contact(self, id: Id) -> EmergencyContact {
        EmergencyContact {
            id,
            user_id: self.user_id,
            name: self.name,
            phone: self.phone,
            relationship: self.relationship,
            is_primary: self.is_primary,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContactUpdate {
    #[serde(default)]
    pub user_id: Option<Id>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub is_primary: Option<bool>,
}

impl EmergencyContactUpdate {
    pub fn apply(self, contact: &mut EmergencyContact) {
        if let Some(user_id) = self.user_id {
            contact.user_id = user_id;
        }
        if let Some(name) = self.name {
            contact.name = name;
        }
        if let Some(phone) = self.phone {
            contact.phone = phone;
        }
        if self.relationship.is_some() {
            contact.relationship = self.relationship;
        }
        if let Some(is_primary) = self.is_primary {
            contact.is_primary = is_primary;
        }
    }
}

// ========================================
// Incidents
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: Id,
    pub user_id: Option<Id>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub location: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub is_anonymous: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    #[serde(default)]
    pub user_id: Option<Id>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default = "default_incident_status")]
    pub status: String,
}

impl NewIncident {
    pub fn into_incident(self, id: Id, created_at: DateTime<Utc>) -> Incident {
        Incident {
            id,
            user_id: self.user_id,
            kind: self.kind,
            description: self.description,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            is_anonymous: self.is_anonymous,
            status: self.status,
            created_at,
        }
    }
}

// ========================================
// SOS alerts
// ========================================

/// Lifecycle of an SOS alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SosStatus {
    #[default]
    Active,
    Resolved,
    Cancelled,
}

impl SosStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SosStatus::Active => "active",
            SosStatus::Resolved => "resolved",
            SosStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SosStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SosStatus::Active),
            "resolved" => Ok(SosStatus::Resolved),
            "cancelled" => Ok(SosStatus::Cancelled),
            other => Err(Error::InvalidInput(format!(
                "Unknown SOS status '{}' (expected active, resolved or cancelled)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAlert {
    pub id: Id,
    pub user_id: Id,
    pub location: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub status: SosStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSosAlert {
    pub user_id: Id,
    pub location: String,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub status: SosStatus,
}

impl NewSosAlert {
    pub fn into_alert(self, id: Id, created_at: DateTime<Utc>) -> SosAlert {
        SosAlert {
            id,
            user_id: self.user_id,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            status: self.status,
            created_at,
        }
    }
}

// ========================================
// Safe zones
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeZone {
    pub id: Id,
    pub name: String,
    /// police, hospital or ngo
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub phone: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSafeZone {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewSafeZone {
    pub fn into_zone(self, id: Id) -> SafeZone {
        SafeZone {
            id,
            name: self.name,
            kind: self.kind,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            phone: self.phone,
            is_active: self.is_active,
        }
    }
}

// ========================================
// User settings
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: Id,
    pub user_id: Id,
    pub location_tracking: bool,
    pub panic_mode: bool,
    pub dark_mode: bool,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserSettings {
    pub user_id: Id,
    #[serde(default = "default_true")]
    pub location_tracking: bool,
    #[serde(default)]
    pub panic_mode: bool,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

impl NewUserSettings {
    /// Settings a user gets the first time they are looked up
    pub fn defaults_for(user_id: Id) -> Self {
        Self {
            user_id,
            location_tracking: true,
            panic_mode: false,
            dark_mode: false,
            language: default_language(),
        }
    }

    pub fn into_settings(self, id: Id) -> UserSettings {
        UserSettings {
            id,
            user_id: self.user_id,
            location_tracking: self.location_tracking,
            panic_mode: self.panic_mode,
            dark_mode: self.dark_mode,
            language: self.language,
        }
    }
}

/// Partial settings update. `userId` in the body is ignored; the owner comes from the path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsUpdate {
    #[serde(default)]
    pub location_tracking: Option<bool>,
    #[serde(default)]
    pub panic_mode: Option<bool>,
    #[serde(default)]
    pub dark_mode: Option<bool>,
    #[serde(default)]
    pub language: Option<String>,
}

impl UserSettingsUpdate {
    pub fn apply(self, settings: &mut UserSettings) {
        if let Some(v) = self.location_tracking {
            settings.location_tracking = v;
        }
        if let Some(v) = self.panic_mode {
            settings.panic_mode = v;
        }
        if let Some(v) = self.dark_mode {
            settings.dark_mode = v;
        }
        if let Some(v) = self.language {
            settings.language = v;
        }
    }
}

// ========================================
// Guardian sessions and alerts
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianSession {
    pub id: Id,
    pub user_id: Id,
    /// smart_guardian, safe_route or threat_monitor
    pub session_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Client configuration, stored as an opaque JSON string
    pub settings: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuardianSession {
    pub user_id: Id,
    pub session_type: String,
    #[serde(default)]
    pub settings: Option<String>,
}

impl NewGuardianSession {
    pub fn into_session(self, id: Id, start_time: DateTime<Utc>) -> GuardianSession {
        GuardianSession {
            id,
            user_id: self.user_id,
            session_type: self.session_type,
            start_time,
            end_time: None,
            is_active: true,
            settings: self.settings,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianSessionUpdate {
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settings: Option<String>,
}

impl GuardianSessionUpdate {
    /// Apply the update, keeping `is_active` and `end_time` consistent: an
    /// active session has no end time and an ended one always has one.
    ///
    /// Deactivating without an explicit end time keeps the stored end time or
    /// stamps `now`. Reactivating clears the end time. Setting an end time
    /// alone ends the session. Client-supplied end times are truncated to
    /// microseconds, the precision the store keeps, and must not precede the
    /// start time. On error the session is left untouched.
    pub fn apply(self, session: &mut GuardianSession, now: DateTime<Utc>) -> Result<(), Error> {
        let end_time = self.end_time.map(|t| t.trunc_subsecs(6));

        let mut errors = Vec::new();
        if self.is_active == Some(true) && end_time.is_some() {
            errors.push(FieldError::new(
                "endTime",
                "must be absent when reactivating a session",
            ));
        }
        if end_time.is_some_and(|end| end < session.start_time) {
            errors.push(FieldError::new("endTime", "must not be before startTime"));
        }
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        if let Some(settings) = self.settings {
            session.settings = Some(settings);
        }
        match (self.is_active, end_time) {
            (Some(true), _) => {
                session.is_active = true;
                session.end_time = None;
            }
            (Some(false), end) | (None, end @ Some(_)) => {
                session.is_active = false;
                session.end_time = end.or(session.end_time).or(Some(now));
            }
            (None, None) => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianAlert {
    pub id: Id,
    pub user_id: Id,
    pub session_id: Option<Id>,
    /// voice_keyword, motion_anomaly, shake_detection or panic_word
    pub trigger_type: String,
    pub confidence: f64,
    pub location: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuardianAlert {
    pub user_id: Id,
    #[serde(default)]
    pub session_id: Option<Id>,
    pub trigger_type: String,
    pub confidence: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

impl NewGuardianAlert {
    pub fn into_alert(self, id: Id, created_at: DateTime<Utc>) -> GuardianAlert {
        GuardianAlert {
            id,
            user_id: self.user_id,
            session_id: self.session_id,
            trigger_type: self.trigger_type,
            confidence: self.confidence,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            is_resolved: false,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_defaults_from_minimal_json() {
        let json = r#"{"type": "harassment", "location": "MG Road"}"#;
        let incident: NewIncident = serde_json::from_str(json).unwrap();

        assert_eq!(incident.kind, "harassment");
        assert_eq!(incident.status, "reported");
        assert!(!incident.is_anonymous);
        assert!(incident.user_id.is_none());
    }

    #[test]
    fn test_safe_zone_serializes_type_and_camel_case() {
        let zone = SafeZone {
            id: 1,
            name: "Ruby Hall Clinic".to_string(),
            kind: "hospital".to_string(),
            address: "Sassoon Road, Pune".to_string(),
            latitude: "18.5204".to_string(),
            longitude: "73.8567".to_string(),
            phone: None,
            is_active: true,
        };

        let json = serde_json::to_value(&zone).unwrap();
        assert_eq!(json["type"], "hospital");
        assert_eq!(json["isActive"], true);
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_user_password_not_serialized() {
        let user = User {
            id: 1,
            username: "asha".to_string(),
            password: "secret".to_string(),
            email: None,
            phone: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "asha");
    }

    #[test]
    fn test_sos_status_parsing() {
        assert_eq!("resolved".parse::<SosStatus>().unwrap(), SosStatus::Resolved);
        assert!("panicking".parse::<SosStatus>().is_err());
        assert_eq!(SosStatus::default(), SosStatus::Active);
    }

    #[test]
    fn test_contact_update_keeps_absent_fields() {
        let mut contact = NewEmergencyContact {
            user_id: 1,
            name: "Priya".to_string(),
            phone: "+91-98000-00000".to_string(),
            relationship: Some("sister".to_string()),
            is_primary: false,
        }
        .into_contact(7);

        EmergencyContactUpdate {
            is_primary: Some(true),
            ..Default::default()
        }
        .apply(&mut contact);

        assert!(contact.is_primary);
        assert_eq!(contact.name, "Priya");
        assert_eq!(contact.relationship.as_deref(), Some("sister"));
    }

    #[test]
    fn test_deactivating_session_stamps_end_time() {
        let start = Utc::now();
        let mut session = NewGuardianSession {
            user_id: 1,
            session_type: "smart_guardian".to_string(),
            settings: None,
        }
        .into_session(1, start);

        let now = start + chrono::Duration::minutes(5);
        GuardianSessionUpdate {
            is_active: Some(false),
            ..Default::default()
        }
        .apply(&mut session, now)
        .unwrap();

        assert!(!session.is_active);
        assert_eq!(session.end_time, Some(now));
    }

    #[test]
    fn test_explicit_end_time_wins() {
        let start = Utc::now();
        let mut session = NewGuardianSession {
            user_id: 1,
            session_type: "safe_route".to_string(),
            settings: None,
        }
        .into_session(1, start);

        let client_end = (start + chrono::Duration::minutes(2)).trunc_subsecs(6);
        GuardianSessionUpdate {
            is_active: Some(false),
            end_time: Some(client_end),
            settings: None,
        }
        .apply(&mut session, start + chrono::Duration::minutes(9))
        .unwrap();

        assert_eq!(session.end_time, Some(client_end));
    }

    #[test]
    fn test_reactivating_session_clears_end_time() {
        let start = Utc::now();
        let mut session = NewGuardianSession {
            user_id: 1,
            session_type: "smart_guardian".to_string(),
            settings: None,
        }
        .into_session(1, start);

        let deactivate = GuardianSessionUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        deactivate
            .apply(&mut session, start + chrono::Duration::minutes(1))
            .unwrap();
        assert!(session.end_time.is_some());

        let reactivate = GuardianSessionUpdate {
            is_active: Some(true),
            ..Default::default()
        };
        reactivate
            .apply(&mut session, start + chrono::Duration::minutes(2))
            .unwrap();

        assert!(session.is_active);
        assert_eq!(session.end_time, None);
    }

    #[test]
    fn test_end_time_alone_ends_session() {
        let start = Utc::now().trunc_subsecs(6);
        let mut session = NewGuardianSession {
            user_id: 1,
            session_type: "safe_route".to_string(),
            settings: None,
        }
        .into_session(1, start);

        let end = start + chrono::Duration::minutes(3);
        GuardianSessionUpdate {
            end_time: Some(end),
            ..Default::default()
        }
        .apply(&mut session, start + chrono::Duration::minutes(4))
        .unwrap();

        assert!(!session.is_active);
        assert_eq!(session.end_time, Some(end));
    }

    #[test]
    fn test_end_before_start_rejected_and_session_untouched() {
        let start = Utc::now();
        let mut session = NewGuardianSession {
            user_id: 1,
            session_type: "smart_guardian".to_string(),
            settings: None,
        }
        .into_session(1, start);
        let before = session.clone();

        let err = GuardianSessionUpdate {
            end_time: Some(start - chrono::Duration::hours(1)),
            settings: Some("{\"sensitivity\":\"high\"}".to_string()),
            ..Default::default()
        }
        .apply(&mut session, start)
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)), "got {err:?}");
        assert_eq!(session, before);
    }
}
