//! Storage behaviour tests
//!
//! Every scenario runs against both backends: the two must be
//! indistinguishable through the `Storage` trait.

use sentinel_common::db::init_memory_database;
use sentinel_common::models::*;
use sentinel_common::{Error, MemStorage, SqliteStorage, Storage};

async fn backends() -> Vec<Box<dyn Storage>> {
    let pool = init_memory_database().await.unwrap();
    vec![
        Box::new(MemStorage::new()),
        Box::new(SqliteStorage::new(pool)),
    ]
}

fn contact(user_id: Id, name: &str) -> NewEmergencyContact {
    NewEmergencyContact {
        user_id,
        name: name.to_string(),
        phone: "+91-98220-00000".to_string(),
        relationship: Some("friend".to_string()),
        is_primary: false,
    }
}

fn incident(user_id: Option<Id>, kind: &str) -> NewIncident {
    NewIncident {
        user_id,
        kind: kind.to_string(),
        description: Some("Followed from the bus stop".to_string()),
        location: "Deccan Gymkhana, Pune".to_string(),
        latitude: Some("18.5167".to_string()),
        longitude: Some("73.8415".to_string()),
        is_anonymous: user_id.is_none(),
        status: "reported".to_string(),
    }
}

fn zone(name: &str, kind: &str, is_active: bool) -> NewSafeZone {
    NewSafeZone {
        name: name.to_string(),
        kind: kind.to_string(),
        address: "Pune".to_string(),
        latitude: "18.52".to_string(),
        longitude: "73.85".to_string(),
        phone: None,
        is_active,
    }
}

#[tokio::test]
async fn test_users_unique_username() {
    for storage in backends().await {
        let user = storage
            .create_user(NewUser {
                username: "asha".to_string(),
                password: "hunter2".to_string(),
                email: Some("asha@example.com".to_string()),
                phone: None,
            })
            .await
            .unwrap();
        assert_eq!(user.id, 1);

        let found = storage.get_user_by_username("asha").await.unwrap().unwrap();
        assert_eq!(found, user);
        assert_eq!(storage.get_user(1).await.unwrap(), Some(user));
        assert!(storage.get_user(99).await.unwrap().is_none());

        let dup = storage
            .create_user(NewUser {
                username: "asha".to_string(),
                password: "other".to_string(),
                email: None,
                phone: None,
            })
            .await;
        assert!(
            matches!(dup, Err(Error::Conflict(_))),
            "{} backend accepted a duplicate username",
            storage.backend()
        );
    }
}

#[tokio::test]
async fn test_contacts_crud() {
    for storage in backends().await {
        let a = storage.create_emergency_contact(contact(1, "Priya")).await.unwrap();
        let b = storage.create_emergency_contact(contact(1, "Rahul")).await.unwrap();
        storage.create_emergency_contact(contact(2, "Someone else")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let listed = storage.get_emergency_contacts(1).await.unwrap();
        assert_eq!(listed, vec![a.clone(), b.clone()]);

        let updated = storage
            .update_emergency_contact(
                a.id,
                EmergencyContactUpdate {
                    phone: Some("+91-90000-11111".to_string()),
                    is_primary: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.phone, "+91-90000-11111");
        assert!(updated.is_primary);
        assert_eq!(updated.name, "Priya");
        assert_eq!(updated.relationship.as_deref(), Some("friend"));

        // Update is visible on the next read
        let listed = storage.get_emergency_contacts(1).await.unwrap();
        assert_eq!(listed[0], updated);

        assert!(storage
            .update_emergency_contact(404, EmergencyContactUpdate::default())
            .await
            .unwrap()
            .is_none());

        assert!(storage.delete_emergency_contact(b.id).await.unwrap());
        assert!(!storage.delete_emergency_contact(b.id).await.unwrap());
        assert_eq!(storage.get_emergency_contacts(1).await.unwrap().len(), 1);

        let c = storage.create_emergency_contact(contact(1, "Kavya")).await.unwrap();
        assert_eq!(c.id, 4, "{} backend reused an id", storage.backend());
    }
}

#[tokio::test]
async fn test_incidents_newest_first_with_limit() {
    for storage in backends().await {
        for i in 0..12 {
            let owner = if i % 2 == 0 { Some(7) } else { None };
            storage.create_incident(incident(owner, "harassment")).await.unwrap();
        }

        let recent = storage.get_incidents(None).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, 12);
        assert_eq!(recent[9].id, 3);

        let three = storage.get_incidents(Some(3)).await.unwrap();
        let ids: Vec<Id> = three.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![12, 11, 10]);

        let mine = storage.get_incidents_by_user(7).await.unwrap();
        assert_eq!(mine.len(), 6);
        assert!(mine.iter().all(|i| i.user_id == Some(7)));
        assert!(mine.windows(2).all(|w| w[0].id < w[1].id));
    }
}

#[tokio::test]
async fn test_incident_fields_round_trip() {
    for storage in backends().await {
        let created = storage.create_incident(incident(None, "stalking")).await.unwrap();
        let listed = storage.get_incidents(Some(1)).await.unwrap();
        assert_eq!(listed, vec![created]);
    }
}

#[tokio::test]
async fn test_sos_alert_status_transitions() {
    for storage in backends().await {
        let alert = storage
            .create_sos_alert(NewSosAlert {
                user_id: 1,
                location: "Camp, Pune".to_string(),
                latitude: Some("18.5018".to_string()),
                longitude: Some("73.8636".to_string()),
                status: SosStatus::Active,
            })
            .await
            .unwrap();
        assert_eq!(alert.status, SosStatus::Active);

        let resolved = storage
            .update_sos_alert_status(alert.id, SosStatus::Resolved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.status, SosStatus::Resolved);
        assert_eq!(resolved.created_at, alert.created_at);

        assert_eq!(storage.get_sos_alerts(1).await.unwrap(), vec![resolved]);
        assert!(storage.get_sos_alerts(2).await.unwrap().is_empty());
        assert!(storage
            .update_sos_alert_status(99, SosStatus::Cancelled)
            .await
            .unwrap()
            .is_none());
    }
}

#[tokio::test]
async fn test_safe_zones_hide_inactive() {
    for storage in backends().await {
        storage.create_safe_zone(zone("Deccan Police", "police", true)).await.unwrap();
        storage.create_safe_zone(zone("Old Clinic", "hospital", false)).await.unwrap();
        storage.create_safe_zone(zone("Sahyadri", "hospital", true)).await.unwrap();

        assert_eq!(storage.count_safe_zones().await.unwrap(), 3);

        let all = storage.get_safe_zones().await.unwrap();
        let names: Vec<&str> = all.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["Deccan Police", "Sahyadri"]);

        let hospitals = storage.get_safe_zones_by_type("hospital").await.unwrap();
        assert_eq!(hospitals.len(), 1);
        assert_eq!(hospitals[0].name, "Sahyadri");

        assert!(storage.get_safe_zones_by_type("fire").await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_user_settings_one_per_user() {
    for storage in backends().await {
        assert!(storage.get_user_settings(5).await.unwrap().is_none());
        assert!(storage
            .update_user_settings(5, UserSettingsUpdate::default())
            .await
            .unwrap()
            .is_none());

        let created = storage
            .create_user_settings(NewUserSettings::defaults_for(5))
            .await
            .unwrap();
        assert!(created.location_tracking);
        assert_eq!(created.language, "english");

        let dup = storage.create_user_settings(NewUserSettings::defaults_for(5)).await;
        assert!(matches!(dup, Err(Error::Conflict(_))));

        let updated = storage
            .update_user_settings(
                5,
                UserSettingsUpdate {
                    dark_mode: Some(true),
                    language: Some("marathi".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.dark_mode);
        assert!(updated.location_tracking);
        assert_eq!(updated.language, "marathi");
        assert_eq!(storage.get_user_settings(5).await.unwrap(), Some(updated));
    }
}

#[tokio::test]
async fn test_guardian_session_lifecycle() {
    for storage in backends().await {
        let session = storage
            .create_guardian_session(NewGuardianSession {
                user_id: 3,
                session_type: "smart_guardian".to_string(),
                settings: Some(r#"{"sensitivity":"high"}"#.to_string()),
            })
            .await
            .unwrap();
        assert!(session.is_active);
        assert!(session.end_time.is_none());

        let ended = storage
            .update_guardian_session(
                session.id,
                GuardianSessionUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!ended.is_active);
        let end_time = ended.end_time.unwrap();
        assert!(end_time >= session.start_time);
        assert_eq!(ended.settings, session.settings);

        assert_eq!(storage.get_guardian_session(session.id).await.unwrap(), Some(ended.clone()));
        assert_eq!(storage.get_guardian_sessions(3).await.unwrap(), vec![ended]);
        assert!(storage
            .update_guardian_session(42, GuardianSessionUpdate::default())
            .await
            .unwrap()
            .is_none());
    }
}

#[tokio::test]
async fn test_guardian_session_end_state_stays_consistent() {
    for storage in backends().await {
        let session = storage
            .create_guardian_session(NewGuardianSession {
                user_id: 4,
                session_type: "safe_route".to_string(),
                settings: None,
            })
            .await
            .unwrap();

        let ended = storage
            .update_guardian_session(
                session.id,
                GuardianSessionUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(ended.end_time.is_some());

        let resumed = storage
            .update_guardian_session(
                session.id,
                GuardianSessionUpdate {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(resumed.is_active);
        assert!(resumed.end_time.is_none());

        let err = storage
            .update_guardian_session(
                session.id,
                GuardianSessionUpdate {
                    end_time: Some(session.start_time - chrono::Duration::days(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {err:?}");
        assert_eq!(
            storage.get_guardian_session(session.id).await.unwrap(),
            Some(resumed)
        );
    }
}

#[tokio::test]
async fn test_guardian_alert_resolve() {
    for storage in backends().await {
        let alert = storage
            .create_guardian_alert(NewGuardianAlert {
                user_id: 3,
                session_id: Some(1),
                trigger_type: "voice_keyword".to_string(),
                confidence: 0.87,
                location: Some("Baner, Pune".to_string()),
                latitude: None,
                longitude: None,
            })
            .await
            .unwrap();
        assert!(!alert.is_resolved);

        let resolved = storage.resolve_guardian_alert(alert.id).await.unwrap().unwrap();
        assert!(resolved.is_resolved);
        assert_eq!(resolved.confidence, 0.87);

        assert_eq!(storage.get_guardian_alerts(3).await.unwrap(), vec![resolved]);
        assert!(storage.resolve_guardian_alert(77).await.unwrap().is_none());
    }
}
