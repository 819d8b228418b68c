//! The Incident entity.
//!
//! One shape for both sources. Vote counters and reporter identity exist
//! only on user-sourced records; vendor records carry `None` there and are
//! serialized without those fields.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use roadpulse_common::{GeoPoint, IncidentSource, IncidentType, Severity};

/// A user-sourced incident is permanently deactivated once its
/// invalidation counter reaches this value.
pub const INVALIDATION_THRESHOLD: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: Uuid,
    pub source: IncidentSource,
    pub incident_type: IncidentType,
    pub location: GeoPoint,
    pub description: String,
    pub severity: Severity,
    pub active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidations: Option<i32>,
}

impl Incident {
    /// A vendor-sourced record as produced by the sync job. The caller is
    /// responsible for handing in an `expires_at` in the future.
    pub fn new_vendor(
        incident_type: IncidentType,
        severity: Severity,
        location: GeoPoint,
        description: Option<String>,
        active: bool,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source: IncidentSource::Vendor,
            incident_type,
            location,
            description: description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| incident_type.label().to_string()),
            severity,
            active,
            expires_at,
            created_at: now,
            updated_at: now,
            reporter_id: None,
            validations: None,
            invalidations: None,
        }
    }

    /// A user-sourced report with zero vote counters.
    pub fn new_report(
        incident_type: IncidentType,
        severity: Severity,
        location: GeoPoint,
        description: Option<String>,
        duration: Duration,
        reporter_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source: IncidentSource::User,
            incident_type,
            location,
            description: description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| incident_type.label().to_string()),
            severity,
            active: true,
            expires_at: now + duration,
            created_at: now,
            updated_at: now,
            reporter_id,
            validations: Some(0),
            invalidations: Some(0),
        }
    }

    /// The uniform "currently relevant" predicate used by all client-facing
    /// reads: active and not yet expired. Reads never mutate.
    pub fn is_relevant(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at
    }

    /// Apply one invalidation vote in place: increment the counter and flip
    /// `active` off once the threshold is reached. The flip is one-way; a
    /// record that is already inactive stays inactive.
    pub fn apply_invalidation(&mut self, now: DateTime<Utc>) {
        let count = self.invalidations.unwrap_or(0) + 1;
        self.invalidations = Some(count);
        if count >= INVALIDATION_THRESHOLD {
            self.active = false;
        }
        self.updated_at = now;
    }

    /// Apply one validation vote in place. Counter only, no state transition.
    pub fn apply_validation(&mut self, now: DateTime<Utc>) {
        self.validations = Some(self.validations.unwrap_or(0) + 1);
        self.updated_at = now;
    }
}
