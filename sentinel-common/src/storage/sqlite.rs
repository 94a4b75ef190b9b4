//! SQLite `Storage` backend
//!
//! Every operation is one statement, or a read followed by one write for
//! partial updates. No explicit transactions: concurrent partial updates of
//! the same row are last-writer-wins.
//!
//! Timestamps are stored as RFC 3339 text with microsecond precision.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{effective_incident_limit, timestamp_now, Storage};
use crate::models::*;
use crate::{Error, Result};

/// Persistent storage over a shared connection pool
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Wrap a pool whose schema is already initialized (see `db::init_database`)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

// ========================================
// Row mapping
// ========================================

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let created_at: String = row.try_get("created_at")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn contact_from_row(row: &SqliteRow) -> Result<EmergencyContact> {
    Ok(EmergencyContact {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        relationship: row.try_get("relationship")?,
        is_primary: row.try_get("is_primary")?,
    })
}

fn incident_from_row(row: &SqliteRow) -> Result<Incident> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Incident {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: row.try_get("type")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        is_anonymous: row.try_get("is_anonymous")?,
        status: row.try_get("status")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn sos_alert_from_row(row: &SqliteRow) -> Result<SosAlert> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(SosAlert {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        location: row.try_get("location")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        status: status.parse()?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn safe_zone_from_row(row: &SqliteRow) -> Result<SafeZone> {
    Ok(SafeZone {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind: row.try_get("type")?,
        address: row.try_get("address")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        phone: row.try_get("phone")?,
        is_active: row.try_get("is_active")?,
    })
}

fn settings_from_row(row: &SqliteRow) -> Result<UserSettings> {
    Ok(UserSettings {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        location_tracking: row.try_get("location_tracking")?,
        panic_mode: row.try_get("panic_mode")?,
        dark_mode: row.try_get("dark_mode")?,
        language: row.try_get("language")?,
    })
}

fn session_from_row(row: &SqliteRow) -> Result<GuardianSession> {
    let start_time: String = row.try_get("start_time")?;
    let end_time: Option<String> = row.try_get("end_time")?;
    Ok(GuardianSession {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        session_type: row.try_get("session_type")?,
        start_time: parse_timestamp(&start_time, "start_time")?,
        end_time: end_time
            .map(|s| parse_timestamp(&s, "end_time"))
            .transpose()?,
        is_active: row.try_get("is_active")?,
        settings: row.try_get("settings")?,
    })
}

fn guardian_alert_from_row(row: &SqliteRow) -> Result<GuardianAlert> {
    let created_at: String = row.try_get("created_at")?;
    Ok(GuardianAlert {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        session_id: row.try_get("session_id")?,
        trigger_type: row.try_get("trigger_type")?,
        confidence: row.try_get("confidence")?,
        location: row.try_get("location")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        is_resolved: row.try_get("is_resolved")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn map_rows<T>(rows: Vec<SqliteRow>, map: fn(&SqliteRow) -> Result<T>) -> Result<Vec<T>> {
    rows.iter().map(map).collect()
}

#[async_trait]
impl Storage for SqliteStorage {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    // ---- Users ----

    async fn get_user(&self, id: Id) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let created_at = timestamp_now();
        let result = sqlx::query(
            "INSERT INTO users (username, password, email, phone, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(format_timestamp(&created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| Error::from_write(e, &format!("user '{}'", user.username)))?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username,
            password: user.password,
            email: user.email,
            phone: user.phone,
            created_at,
        })
    }

    // ---- Emergency contacts ----

    async fn get_emergency_contacts(&self, user_id: Id) -> Result<Vec<EmergencyContact>> {
        let rows = sqlx::query("SELECT * FROM emergency_contacts WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        map_rows(rows, contact_from_row)
    }

    async fn create_emergency_contact(
        &self,
        contact: NewEmergencyContact,
    ) -> Result<EmergencyContact> {
        let result = sqlx::query(
            r#"
            INSERT INTO emergency_contacts (user_id, name, phone, relationship, is_primary)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(contact.user_id)
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.relationship)
        .bind(contact.is_primary)
        .execute(&self.pool)
        .await?;

        Ok(contact.into_contact(result.last_insert_rowid()))
    }

    async fn update_emergency_contact(
        &self,
        id: Id,
        update: EmergencyContactUpdate,
    ) -> Result<Option<EmergencyContact>> {
        let row = sqlx::query("SELECT * FROM emergency_contacts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut contact = contact_from_row(&row)?;
        update.apply(&mut contact);

        let result = sqlx::query(
            r#"
            UPDATE emergency_contacts
            SET user_id = ?, name = ?, phone = ?, relationship = ?, is_primary = ?
            WHERE id = ?
            "#,
        )
        .bind(contact.user_id)
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.relationship)
        .bind(contact.is_primary)
        .bind(id)
        .execute(&self.pool)
        .await?;

        // Deleted between the read and the write
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(contact))
    }

    async fn delete_emergency_contact(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM emergency_contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Incidents ----

    async fn get_incidents(&self, limit: Option<u32>) -> Result<Vec<Incident>> {
        let rows = sqlx::query("SELECT * FROM incidents ORDER BY id DESC LIMIT ?")
            .bind(effective_incident_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        map_rows(rows, incident_from_row)
    }

    async fn get_incidents_by_user(&self, user_id: Id) -> Result<Vec<Incident>> {
        let rows = sqlx::query("SELECT * FROM incidents WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        map_rows(rows, incident_from_row)
    }

    async fn create_incident(&self, incident: NewIncident) -> Result<Incident> {
        let created_at = timestamp_now();
        let result = sqlx::query(
            r#"
            INSERT INTO incidents (
                user_id, type, description, location, latitude, longitude,
                is_anonymous, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(incident.user_id)
        .bind(&incident.kind)
        .bind(&incident.description)
        .bind(&incident.location)
        .bind(&incident.latitude)
        .bind(&incident.longitude)
        .bind(incident.is_anonymous)
        .bind(&incident.status)
        .bind(format_timestamp(&created_at))
        .execute(&self.pool)
        .await?;

        Ok(incident.into_incident(result.last_insert_rowid(), created_at))
    }

    // ---- SOS alerts ----

    async fn get_sos_alerts(&self, user_id: Id) -> Result<Vec<SosAlert>> {
        let rows = sqlx::query("SELECT * FROM sos_alerts WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        map_rows(rows, sos_alert_from_row)
    }

    async fn create_sos_alert(&self, alert: NewSosAlert) -> Result<SosAlert> {
        let created_at = timestamp_now();
        let result = sqlx::query(
            r#"
            INSERT INTO sos_alerts (user_id, location, latitude, longitude, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(alert.user_id)
        .bind(&alert.location)
        .bind(&alert.latitude)
        .bind(&alert.longitude)
        .bind(alert.status.as_str())
        .bind(format_timestamp(&created_at))
        .execute(&self.pool)
        .await?;

        Ok(alert.into_alert(result.last_insert_rowid(), created_at))
    }

    async fn update_sos_alert_status(
        &self,
        id: Id,
        status: SosStatus,
    ) -> Result<Option<SosAlert>> {
        let result = sqlx::query("UPDATE sos_alerts SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("SELECT * FROM sos_alerts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(sos_alert_from_row)
            .transpose()
    }

    // ---- Safe zones ----

    async fn get_safe_zones(&self) -> Result<Vec<SafeZone>> {
        let rows = sqlx::query("SELECT * FROM safe_zones WHERE is_active = 1 ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        map_rows(rows, safe_zone_from_row)
    }

    async fn get_safe_zones_by_type(&self, kind: &str) -> Result<Vec<SafeZone>> {
        let rows = sqlx::query(
            "SELECT * FROM safe_zones WHERE is_active = 1 AND type = ? ORDER BY id",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        map_rows(rows, safe_zone_from_row)
    }

    async fn create_safe_zone(&self, zone: NewSafeZone) -> Result<SafeZone> {
        let result = sqlx::query(
            r#"
            INSERT INTO safe_zones (name, type, address, latitude, longitude, phone, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&zone.name)
        .bind(&zone.kind)
        .bind(&zone.address)
        .bind(&zone.latitude)
        .bind(&zone.longitude)
        .bind(&zone.phone)
        .bind(zone.is_active)
        .execute(&self.pool)
        .await?;

        Ok(zone.into_zone(result.last_insert_rowid()))
    }

    async fn count_safe_zones(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM safe_zones")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    // ---- User settings ----

    async fn get_user_settings(&self, user_id: Id) -> Result<Option<UserSettings>> {
        sqlx::query("SELECT * FROM user_settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(settings_from_row)
            .transpose()
    }

    async fn create_user_settings(&self, settings: NewUserSettings) -> Result<UserSettings> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, location_tracking, panic_mode, dark_mode, language)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(settings.user_id)
        .bind(settings.location_tracking)
        .bind(settings.panic_mode)
        .bind(settings.dark_mode)
        .bind(&settings.language)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::from_write(e, &format!("settings for user {}", settings.user_id)))?;

        Ok(settings.into_settings(result.last_insert_rowid()))
    }

    async fn update_user_settings(
        &self,
        user_id: Id,
        update: UserSettingsUpdate,
    ) -> Result<Option<UserSettings>> {
        let Some(mut settings) = self.get_user_settings(user_id).await? else {
            return Ok(None);
        };
        update.apply(&mut settings);

        let result = sqlx::query(
            r#"
            UPDATE user_settings
            SET location_tracking = ?, panic_mode = ?, dark_mode = ?, language = ?
            WHERE user_id = ?
            "#,
        )
        .bind(settings.location_tracking)
        .bind(settings.panic_mode)
        .bind(settings.dark_mode)
        .bind(&settings.language)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(settings))
    }

    // ---- Guardian sessions ----

    async fn create_guardian_session(
        &self,
        session: NewGuardianSession,
    ) -> Result<GuardianSession> {
        let start_time = timestamp_now();
        let result = sqlx::query(
            r#"
            INSERT INTO guardian_sessions (user_id, session_type, start_time, is_active, settings)
            VALUES (?, ?, ?, 1, ?)
            "#,
        )
        .bind(session.user_id)
        .bind(&session.session_type)
        .bind(format_timestamp(&start_time))
        .bind(&session.settings)
        .execute(&self.pool)
        .await?;

        Ok(session.into_session(result.last_insert_rowid(), start_time))
    }

    async fn get_guardian_session(&self, id: Id) -> Result<Option<GuardianSession>> {
        sqlx::query("SELECT * FROM guardian_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(session_from_row)
            .transpose()
    }

    async fn get_guardian_sessions(&self, user_id: Id) -> Result<Vec<GuardianSession>> {
        let rows = sqlx::query("SELECT * FROM guardian_sessions WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        map_rows(rows, session_from_row)
    }

    async fn update_guardian_session(
        &self,
        id: Id,
        update: GuardianSessionUpdate,
    ) -> Result<Option<GuardianSession>> {
        let Some(mut session) = self.get_guardian_session(id).await? else {
            return Ok(None);
        };
        update.apply(&mut session, timestamp_now())?;

        let result = sqlx::query(
            "UPDATE guardian_sessions SET end_time = ?, is_active = ?, settings = ? WHERE id = ?",
        )
        .bind(session.end_time.as_ref().map(format_timestamp))
        .bind(session.is_active)
        .bind(&session.settings)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(session))
    }

    // ---- Guardian alerts ----

    async fn create_guardian_alert(&self, alert: NewGuardianAlert) -> Result<GuardianAlert> {
        let created_at = timestamp_now();
        let result = sqlx::query(
            r#"
            INSERT INTO guardian_alerts (
                user_id, session_id, trigger_type, confidence,
                location, latitude, longitude, is_resolved, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(alert.user_id)
        .bind(alert.session_id)
        .bind(&alert.trigger_type)
        .bind(alert.confidence)
        .bind(&alert.location)
        .bind(&alert.latitude)
        .bind(&alert.longitude)
        .bind(format_timestamp(&created_at))
        .execute(&self.pool)
        .await?;

        Ok(alert.into_alert(result.last_insert_rowid(), created_at))
    }

    async fn get_guardian_alerts(&self, user_id: Id) -> Result<Vec<GuardianAlert>> {
        let rows = sqlx::query("SELECT * FROM guardian_alerts WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        map_rows(rows, guardian_alert_from_row)
    }

    async fn resolve_guardian_alert(&self, id: Id) -> Result<Option<GuardianAlert>> {
        let result = sqlx::query("UPDATE guardian_alerts SET is_resolved = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("SELECT * FROM guardian_alerts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(guardian_alert_from_row)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_text_round_trips_at_micros() {
        let now = timestamp_now();
        let text = format_timestamp(&now);
        assert!(text.ends_with('Z'));
        assert_eq!(parse_timestamp(&text, "created_at").unwrap(), now);
    }

    #[test]
    fn test_bad_timestamp_is_internal_error() {
        let err = parse_timestamp("yesterday", "created_at").unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
