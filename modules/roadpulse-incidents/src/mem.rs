//! In-memory incident store.
//!
//! Backs tests and single-node deployments. A single `RwLock` over the map
//! serializes writers, so the invalidation increment and its threshold
//! check happen under one write lock and are visible as a unit. Readers
//! take the shared lock and never block behind each other.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use roadpulse_common::{BoundingBox, IncidentSource, RoadPulseError};

use crate::incident::Incident;
use crate::repo::{IncidentRepo, ReportFilter};

#[derive(Default)]
pub struct MemoryIncidentStore {
    records: RwLock<HashMap<Uuid, Incident>>,
}

impl MemoryIncidentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentRepo for MemoryIncidentStore {
    async fn insert(&self, incident: &Incident) -> Result<(), RoadPulseError> {
        let mut records = self.records.write().await;
        records.insert(incident.id, incident.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Incident>, RoadPulseError> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn active_vendor_in_box(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Vec<Incident>, RoadPulseError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| {
                r.source == IncidentSource::Vendor && r.active && bbox.contains(r.location)
            })
            .cloned()
            .collect())
    }

    async fn user_reports(&self, filter: &ReportFilter) -> Result<Vec<Incident>, RoadPulseError> {
        let records = self.records.read().await;
        let mut reports: Vec<Incident> = records
            .values()
            .filter(|r| r.source == IncidentSource::User)
            .filter(|r| filter.bbox.is_none_or(|b| b.contains(r.location)))
            .filter(|r| {
                filter
                    .reporter_id
                    .as_ref()
                    .is_none_or(|rid| r.reporter_id.as_deref() == Some(rid.as_str()))
            })
            .filter(|r| filter.active.is_none_or(|a| r.active == a))
            .filter(|r| filter.incident_type.is_none_or(|t| r.incident_type == t))
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Incident, RoadPulseError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(RoadPulseError::NotFound(id))?;
        record.active = active;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn record_validation(&self, id: Uuid) -> Result<Incident, RoadPulseError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .filter(|r| r.source == IncidentSource::User)
            .ok_or(RoadPulseError::NotFound(id))?;
        record.apply_validation(Utc::now());
        Ok(record.clone())
    }

    async fn record_invalidation(&self, id: Uuid) -> Result<Incident, RoadPulseError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .filter(|r| r.source == IncidentSource::User)
            .ok_or(RoadPulseError::NotFound(id))?;
        record.apply_invalidation(Utc::now());
        Ok(record.clone())
    }
}
