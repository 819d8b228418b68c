//! The storage seam.
//!
//! Spatial predicates are explicit (`FindActiveInBox` style methods) rather
//! than query-builder generated. The vote increment plus threshold check is
//! a single repo operation so concurrent votes cannot lose updates.

use async_trait::async_trait;
use uuid::Uuid;

use roadpulse_common::{BoundingBox, IncidentType, RoadPulseError};

use crate::incident::Incident;

/// Filters for user-report listings. All optional; `active` replaces the
/// default relevance predicate when present (administrative views).
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub bbox: Option<BoundingBox>,
    pub reporter_id: Option<String>,
    pub active: Option<bool>,
    pub incident_type: Option<IncidentType>,
}

#[async_trait]
pub trait IncidentRepo: Send + Sync {
    async fn insert(&self, incident: &Incident) -> Result<(), RoadPulseError>;

    async fn get(&self, id: Uuid) -> Result<Option<Incident>, RoadPulseError>;

    /// Active vendor-sourced incidents inside a box. The sync job matches
    /// incoming feed records against this set; the query service reads it.
    async fn active_vendor_in_box(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Vec<Incident>, RoadPulseError>;

    /// User-sourced incidents matching a filter, newest `created_at` first.
    async fn user_reports(&self, filter: &ReportFilter) -> Result<Vec<Incident>, RoadPulseError>;

    /// Set the active flag, bumping `updated_at`. Used by the sync job to
    /// refresh matched vendor records and by the administrative resolve.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Incident, RoadPulseError>;

    /// Increment the validation counter. No state transition.
    async fn record_validation(&self, id: Uuid) -> Result<Incident, RoadPulseError>;

    /// Atomically increment the invalidation counter and deactivate the
    /// record when the threshold is reached. Increment and flip are visible
    /// as a unit; the flip is never undone.
    async fn record_invalidation(&self, id: Uuid) -> Result<Incident, RoadPulseError>;
}
