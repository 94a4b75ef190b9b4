//! Emergency contact notification
//!
//! When an SOS alert is raised the handler passes the alert and the user's
//! emergency contacts to a [`ContactNotifier`]. Notification is best effort:
//! a failure is logged and never fails the SOS request.

use async_trait::async_trait;
use sentinel_common::models::{EmergencyContact, SosAlert};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait ContactNotifier: Send + Sync {
    /// Tell each contact about the alert. Returns how many were notified.
    async fn notify(
        &self,
        alert: &SosAlert,
        contacts: &[EmergencyContact],
    ) -> Result<usize, NotifyError>;
}

/// Records notifications in the log instead of delivering them
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl ContactNotifier for TracingNotifier {
    async fn notify(
        &self,
        alert: &SosAlert,
        contacts: &[EmergencyContact],
    ) -> Result<usize, NotifyError> {
        if contacts.is_empty() {
            warn!(
                alert_id = alert.id,
                user_id = alert.user_id,
                "SOS alert raised but user has no emergency contacts"
            );
            return Ok(0);
        }

        for contact in contacts {
            info!(
                alert_id = alert.id,
                contact_id = contact.id,
                primary = contact.is_primary,
                "SOS notification for {} ({}): {}",
                contact.name,
                contact.phone,
                alert.location
            );
        }

        Ok(contacts.len())
    }
}
