//! In-memory `Storage` backend
//!
//! All tables live behind one async `RwLock`. Ordered maps keep listings in id
//! order without sorting; counters start at 1 and are never rewound, so ids of
//! deleted rows are not reused.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{effective_incident_limit, timestamp_now, Storage};
use crate::models::*;
use crate::{Error, Result};

/// One table: rows by id plus the next id to hand out
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<Id, T>,
    next_id: Id,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(Id) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn filtered(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| keep(row)).cloned().collect()
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    emergency_contacts: Table<EmergencyContact>,
    incidents: Table<Incident>,
    sos_alerts: Table<SosAlert>,
    safe_zones: Table<SafeZone>,
    user_settings: Table<UserSettings>,
    guardian_sessions: Table<GuardianSession>,
    guardian_alerts: Table<GuardianAlert>,
}

/// Process-local storage for tests and demo runs. Starts empty.
#[derive(Debug, Default)]
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.rows.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.rows.values().any(|u| u.username == user.username) {
            return Err(Error::Conflict(format!(
                "user '{}' already exists",
                user.username
            )));
        }
        let created_at = timestamp_now();
        Ok(tables.users.insert_with(|id| User {
            id,
            username: user.username,
            password: user.password,
            email: user.email,
            phone: user.phone,
            created_at,
        }))
    }

    async fn get_emergency_contacts(&self, user_id: Id) -> Result<Vec<EmergencyContact>> {
        let tables = self.tables.read().await;
        Ok(tables.emergency_contacts.filtered(|c| c.user_id == user_id))
    }

    async fn create_emergency_contact(
        &self,
        contact: NewEmergencyContact,
    ) -> Result<EmergencyContact> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .emergency_contacts
            .insert_with(|id| contact.into_contact(id)))
    }

    async fn update_emergency_contact(
        &self,
        id: Id,
        update: EmergencyContactUpdate,
    ) -> Result<Option<EmergencyContact>> {
        let mut tables = self.tables.write().await;
        Ok(tables.emergency_contacts.rows.get_mut(&id).map(|contact| {
            update.apply(contact);
            contact.clone()
        }))
    }

    async fn delete_emergency_contact(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.emergency_contacts.rows.remove(&id).is_some())
    }

    async fn get_incidents(&self, limit: Option<u32>) -> Result<Vec<Incident>> {
        let limit = effective_incident_limit(limit) as usize;
        let tables = self.tables.read().await;
        Ok(tables
            .incidents
            .rows
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_incidents_by_user(&self, user_id: Id) -> Result<Vec<Incident>> {
        let tables = self.tables.read().await;
        Ok(tables.incidents.filtered(|i| i.user_id == Some(user_id)))
    }

    async fn create_incident(&self, incident: NewIncident) -> Result<Incident> {
        let created_at = timestamp_now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .incidents
            .insert_with(|id| incident.into_incident(id, created_at)))
    }

    async fn get_sos_alerts(&self, user_id: Id) -> Result<Vec<SosAlert>> {
        let tables = self.tables.read().await;
        Ok(tables.sos_alerts.filtered(|a| a.user_id == user_id))
    }

    async fn create_sos_alert(&self, alert: NewSosAlert) -> Result<SosAlert> {
        let created_at = timestamp_now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .sos_alerts
            .insert_with(|id| alert.into_alert(id, created_at)))
    }

    async fn update_sos_alert_status(
        &self,
        id: Id,
        status: SosStatus,
    ) -> Result<Option<SosAlert>> {
        let mut tables = self.tables.write().await;
        Ok(tables.sos_alerts.rows.get_mut(&id).map(|alert| {
            alert.status = status;
            alert.clone()
        }))
    }

    async fn get_safe_zones(&self) -> Result<Vec<SafeZone>> {
        let tables = self.tables.read().await;
        Ok(tables.safe_zones.filtered(|z| z.is_active))
    }

    async fn get_safe_zones_by_type(&self, kind: &str) -> Result<Vec<SafeZone>> {
        let tables = self.tables.read().await;
        Ok(tables
            .safe_zones
            .filtered(|z| z.is_active && z.kind == kind))
    }

    async fn create_safe_zone(&self, zone: NewSafeZone) -> Result<SafeZone> {
        let mut tables = self.tables.write().await;
        Ok(tables.safe_zones.insert_with(|id| zone.into_zone(id)))
    }

    async fn count_safe_zones(&self) -> Result<u64> {
        Ok(self.tables.read().await.safe_zones.rows.len() as u64)
    }

    async fn get_user_settings(&self, user_id: Id) -> Result<Option<UserSettings>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_settings
            .rows
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn create_user_settings(&self, settings: NewUserSettings) -> Result<UserSettings> {
        let mut tables = self.tables.write().await;
        if tables
            .user_settings
            .rows
            .values()
            .any(|s| s.user_id == settings.user_id)
        {
            return Err(Error::Conflict(format!(
                "settings for user {} already exist",
                settings.user_id
            )));
        }
        Ok(tables
            .user_settings
            .insert_with(|id| settings.into_settings(id)))
    }

    async fn update_user_settings(
        &self,
        user_id: Id,
        update: UserSettingsUpdate,
    ) -> Result<Option<UserSettings>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .user_settings
            .rows
            .values_mut()
            .find(|s| s.user_id == user_id)
            .map(|settings| {
                update.apply(settings);
                settings.clone()
            }))
    }

    async fn create_guardian_session(
        &self,
        session: NewGuardianSession,
    ) -> Result<GuardianSession> {
        let start_time = timestamp_now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .guardian_sessions
            .insert_with(|id| session.into_session(id, start_time)))
    }

    async fn get_guardian_session(&self, id: Id) -> Result<Option<GuardianSession>> {
        Ok(self
            .tables
            .read()
            .await
            .guardian_sessions
            .rows
            .get(&id)
            .cloned())
    }

    async fn get_guardian_sessions(&self, user_id: Id) -> Result<Vec<GuardianSession>> {
        let tables = self.tables.read().await;
        Ok(tables.guardian_sessions.filtered(|s| s.user_id == user_id))
    }

    async fn update_guardian_session(
        &self,
        id: Id,
        update: GuardianSessionUpdate,
    ) -> Result<Option<GuardianSession>> {
        let now = timestamp_now();
        let mut tables = self.tables.write().await;
        let Some(session) = tables.guardian_sessions.rows.get_mut(&id) else {
            return Ok(None);
        };
        update.apply(session, now)?;
        Ok(Some(session.clone()))
    }

    async fn create_guardian_alert(&self, alert: NewGuardianAlert) -> Result<GuardianAlert> {
        let created_at = timestamp_now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .guardian_alerts
            .insert_with(|id| alert.into_alert(id, created_at)))
    }

    async fn get_guardian_alerts(&self, user_id: Id) -> Result<Vec<GuardianAlert>> {
        let tables = self.tables.read().await;
        Ok(tables.guardian_alerts.filtered(|a| a.user_id == user_id))
    }

    async fn resolve_guardian_alert(&self, id: Id) -> Result<Option<GuardianAlert>> {
        let mut tables = self.tables.write().await;
        Ok(tables.guardian_alerts.rows.get_mut(&id).map(|alert| {
            alert.is_resolved = true;
            alert.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let storage = MemStorage::new();
        let contact = || NewEmergencyContact {
            user_id: 1,
            name: "Meera".to_string(),
            phone: "+91-90000-00001".to_string(),
            relationship: None,
            is_primary: false,
        };

        let first = storage.create_emergency_contact(contact()).await.unwrap();
        assert!(storage.delete_emergency_contact(first.id).await.unwrap());

        let second = storage.create_emergency_contact(contact()).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let storage = MemStorage::new();
        assert_eq!(storage.count_safe_zones().await.unwrap(), 0);
        assert!(storage.get_incidents(None).await.unwrap().is_empty());
    }
}
