//! Request payload validation
//!
//! Serde already rejects missing required fields and wrong JSON types. The
//! checks here cover what the type system cannot: blank strings, non-positive
//! owner ids, coordinates out of range and confidence scores outside 0..=1.
//! Every failing field is reported, not just the first.

use crate::models::{
    EmergencyContactUpdate, GuardianSessionUpdate, NewEmergencyContact, NewGuardianAlert,
    NewGuardianSession, NewIncident, NewSafeZone, NewSosAlert, NewUser, NewUserSettings,
    UserSettingsUpdate,
};
use crate::{Error, FieldError, Result};

/// Implemented by every payload the API accepts
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Accumulates field errors
#[derive(Debug, Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn required_text(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(FieldError::new(field, "must not be blank"));
        }
        self
    }

    fn optional_text(&mut self, field: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.required_text(field, v);
        }
        self
    }

    fn positive_id(&mut self, field: &'static str, value: i64) -> &mut Self {
        if value <= 0 {
            self.errors.push(FieldError::new(field, "must be a positive id"));
        }
        self
    }

    fn latitude(&mut self, field: &'static str, value: Option<&str>) -> &mut Self {
        self.coordinate(field, value, 90.0)
    }

    fn longitude(&mut self, field: &'static str, value: Option<&str>) -> &mut Self {
        self.coordinate(field, value, 180.0)
    }

    fn coordinate(&mut self, field: &'static str, value: Option<&str>, bound: f64) -> &mut Self {
        let Some(raw) = value else {
            return self;
        };
        match raw.trim().parse::<f64>() {
            Ok(deg) if deg.is_finite() && deg.abs() <= bound => {}
            Ok(_) => self.errors.push(FieldError::new(
                field,
                format!("must be between -{bound} and {bound} degrees"),
            )),
            Err(_) => self
                .errors
                .push(FieldError::new(field, "must be a decimal number of degrees")),
        }
        self
    }

    fn unit_interval(&mut self, field: &'static str, value: f64) -> &mut Self {
        if !(0.0..=1.0).contains(&value) {
            self.errors.push(FieldError::new(field, "must be between 0 and 1"));
        }
        self
    }

    fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<()> {
        Checks::default()
            .required_text("username", &self.username)
            .required_text("password", &self.password)
            .optional_text("email", self.email.as_deref())
            .optional_text("phone", self.phone.as_deref())
            .finish()
    }
}

impl Validate for NewEmergencyContact {
    fn validate(&self) -> Result<()> {
        Checks::default()
            .positive_id("userId", self.user_id)
            .required_text("name", &self.name)
            .required_text("phone", &self.phone)
            .finish()
    }
}

impl Validate for EmergencyContactUpdate {
    fn validate(&self) -> Result<()> {
        let mut checks = Checks::default();
        if let Some(user_id) = self.user_id {
            checks.positive_id("userId", user_id);
        }
        checks
            .optional_text("name", self.name.as_deref())
            .optional_text("phone", self.phone.as_deref())
            .finish()
    }
}

impl Validate for NewIncident {
    fn validate(&self) -> Result<()> {
        let mut checks = Checks::default();
        if let Some(user_id) = self.user_id {
            checks.positive_id("userId", user_id);
        }
        checks
            .required_text("type", &self.kind)
            .required_text("location", &self.location)
            .required_text("status", &self.status)
            .latitude("latitude", self.latitude.as_deref())
            .longitude("longitude", self.longitude.as_deref())
            .finish()
    }
}

impl Validate for NewSosAlert {
    fn validate(&self) -> Result<()> {
        Checks::default()
            .positive_id("userId", self.user_id)
            .required_text("location", &self.location)
            .latitude("latitude", self.latitude.as_deref())
            .longitude("longitude", self.longitude.as_deref())
            .finish()
    }
}

impl Validate for NewSafeZone {
    fn validate(&self) -> Result<()> {
        Checks::default()
            .required_text("name", &self.name)
            .required_text("type", &self.kind)
            .required_text("address", &self.address)
            .latitude("latitude", Some(&self.latitude))
            .longitude("longitude", Some(&self.longitude))
            .finish()
    }
}

impl Validate for NewUserSettings {
    fn validate(&self) -> Result<()> {
        Checks::default()
            .positive_id("userId", self.user_id)
            .required_text("language", &self.language)
            .finish()
    }
}

impl Validate for UserSettingsUpdate {
    fn validate(&self) -> Result<()> {
        Checks::default()
            .optional_text("language", self.language.as_deref())
            .finish()
    }
}

impl Validate for NewGuardianSession {
    fn validate(&self) -> Result<()> {
        Checks::default()
            .positive_id("userId", self.user_id)
            .required_text("sessionType", &self.session_type)
            .finish()
    }
}

/// Checks that need no stored row. The end time is checked against the start
/// time when the update is applied.
impl Validate for GuardianSessionUpdate {
    fn validate(&self) -> Result<()> {
        let mut checks = Checks::default();
        if self.is_active == Some(true) && self.end_time.is_some() {
            checks.errors.push(FieldError::new(
                "endTime",
                "must be absent when reactivating a session",
            ));
        }
        checks.finish()
    }
}

impl Validate for NewGuardianAlert {
    fn validate(&self) -> Result<()> {
        let mut checks = Checks::default();
        if let Some(session_id) = self.session_id {
            checks.positive_id("sessionId", session_id);
        }
        checks
            .positive_id("userId", self.user_id)
            .required_text("triggerType", &self.trigger_type)
            .unit_interval("confidence", self.confidence)
            .latitude("latitude", self.latitude.as_deref())
            .longitude("longitude", self.longitude.as_deref())
            .finish()
    }
}
