//! Translation from vendor codes to the internal vocabulary.
//!
//! The feed describes incidents with a numeric icon category (documented
//! range 0-14) and a magnitude-of-delay code (documented range 0-4). Both
//! lookups are total: codes outside the documented range degrade to a
//! default instead of failing the pipeline.

use roadpulse_common::{IncidentType, Severity};

/// Map a vendor icon category code to an internal incident type.
/// Undocumented codes map to `Hazard`.
pub fn incident_type_for(category: i32) -> IncidentType {
    match category {
        1 => IncidentType::Accident,
        2 | 3 | 4 | 5 | 10 => IncidentType::Hazard, // fog, dangerous conditions, rain, ice, wind
        6 => IncidentType::Congestion,
        7 | 8 => IncidentType::RoadClosed, // lane closed, road closed
        9 => IncidentType::Roadworks,
        11 => IncidentType::Flood,
        14 => IncidentType::Other, // broken-down vehicle
        0 => IncidentType::Other,
        _ => IncidentType::Hazard,
    }
}

/// Map a vendor magnitude-of-delay code to an internal severity.
/// Code 0 is "unknown" and anything undocumented degrades to `Moderate`.
pub fn severity_for(magnitude: i32) -> Severity {
    match magnitude {
        1 => Severity::Low,
        2 => Severity::Moderate,
        3 => Severity::High,
        4 => Severity::Severe,
        _ => Severity::Moderate,
    }
}

/// Convenience pair lookup used by the sync job.
pub fn map_codes(category: i32, magnitude: i32) -> (IncidentType, Severity) {
    (incident_type_for(category), severity_for(magnitude))
}
