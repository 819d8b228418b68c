//! User-submitted incident reports: submission, trust voting, resolution.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;
use uuid::Uuid;

use roadpulse_common::{GeoPoint, IncidentType, RoadPulseError, Severity};

use crate::incident::Incident;
use crate::repo::IncidentRepo;

const DEFAULT_DURATION_MINUTES: i64 = 60;

/// A report as it arrives from the API: strings still unvalidated.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub incident_type: String,
    pub location: GeoPoint,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub duration_minutes: Option<i64>,
    pub reporter_id: Option<String>,
}

pub struct UserReportService {
    repo: Arc<dyn IncidentRepo>,
}

impl UserReportService {
    pub fn new(repo: Arc<dyn IncidentRepo>) -> Self {
        Self { repo }
    }

    /// Validate and persist a new user report. All input checks happen
    /// before any mutation; the created record is returned.
    pub async fn submit(&self, report: NewReport) -> Result<Incident, RoadPulseError> {
        let incident_type: IncidentType = report
            .incident_type
            .parse()
            .map_err(|e| RoadPulseError::Validation(format!("incidentType: {e}")))?;

        let severity = match &report.severity {
            Some(raw) => raw
                .parse()
                .map_err(|e| RoadPulseError::Validation(format!("severity: {e}")))?,
            None => Severity::Moderate,
        };

        let point = report.location;
        if !(-180.0..=180.0).contains(&point.lon) || !(-90.0..=90.0).contains(&point.lat) {
            return Err(RoadPulseError::Validation(format!(
                "coordinates: [{}, {}] is not a valid lon/lat pair",
                point.lon, point.lat
            )));
        }

        let minutes = report.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        if minutes <= 0 {
            return Err(RoadPulseError::Validation(
                "durationMinutes: must be positive".to_string(),
            ));
        }

        let incident = Incident::new_report(
            incident_type,
            severity,
            point,
            report.description,
            Duration::minutes(minutes),
            report.reporter_id,
        );
        self.repo.insert(&incident).await?;

        info!(
            id = %incident.id,
            incident_type = %incident.incident_type,
            "User report created"
        );
        Ok(incident)
    }

    /// One corroborating vote. Counter only.
    pub async fn validate(&self, id: Uuid) -> Result<Incident, RoadPulseError> {
        self.repo.record_validation(id).await
    }

    /// One refuting vote. The repo deactivates the record atomically once
    /// the invalidation threshold is reached.
    pub async fn invalidate(&self, id: Uuid) -> Result<Incident, RoadPulseError> {
        let incident = self.repo.record_invalidation(id).await?;
        if !incident.active {
            info!(id = %incident.id, "Report deactivated by community invalidation");
        }
        Ok(incident)
    }

    /// Administrative resolve: unconditionally deactivate.
    pub async fn resolve(&self, id: Uuid) -> Result<Incident, RoadPulseError> {
        let incident = self.repo.set_active(id, false).await?;
        info!(id = %incident.id, "Report resolved");
        Ok(incident)
    }
}
