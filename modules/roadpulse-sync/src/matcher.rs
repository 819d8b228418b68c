//! Identity matching between incoming feed records and stored incidents.
//!
//! The trait insulates callers from the matching strategy: today a linear
//! scan with exact coordinate equality (the feed re-sends stable
//! coordinates for a persisting event), later possibly a grid or R-tree
//! without touching the sync job.

use uuid::Uuid;

use roadpulse_common::{GeoPoint, IncidentType};
use roadpulse_incidents::Incident;

pub trait GeoMatcher: Send + Sync {
    /// Does the candidate refer to the same real-world event as one of the
    /// stored records? Returns the stored record's id if so.
    fn find_match(
        &self,
        incident_type: IncidentType,
        point: GeoPoint,
        candidates: &[Incident],
    ) -> Option<Uuid>;
}

/// Identical type and exact coordinate equality. If several candidates
/// match (the active-uniqueness invariant normally prevents this), the most
/// recently updated one wins.
pub struct ExactMatcher;

impl GeoMatcher for ExactMatcher {
    fn find_match(
        &self,
        incident_type: IncidentType,
        point: GeoPoint,
        candidates: &[Incident],
    ) -> Option<Uuid> {
        candidates
            .iter()
            .filter(|c| c.incident_type == incident_type && c.location == point)
            .max_by_key(|c| c.updated_at)
            .map(|c| c.id)
    }
}
