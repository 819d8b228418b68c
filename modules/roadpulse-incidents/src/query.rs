//! Read side: "what incidents are active in this box".
//!
//! Vendor-sourced and user-sourced records are returned as two collections
//! the caller may combine. When a live feed handle is attached, vendor
//! results are refreshed best-effort at query time; feed failures are
//! logged and the stored records are served alone.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::warn;

use roadpulse_common::{BoundingBox, IncidentType, RoadPulseError};
use roadpulse_vendor::{taxonomy, IncidentFeed};

use crate::incident::Incident;
use crate::repo::{IncidentRepo, ReportFilter};

const LIVE_REFRESH_MAX_RESULTS: u32 = 100;

#[derive(Debug, Serialize)]
pub struct MergedIncidents {
    pub vendor: Vec<Incident>,
    pub user: Vec<Incident>,
}

pub struct QueryService {
    repo: Arc<dyn IncidentRepo>,
    feed: Option<Arc<dyn IncidentFeed>>,
}

impl QueryService {
    pub fn new(repo: Arc<dyn IncidentRepo>) -> Self {
        Self { repo, feed: None }
    }

    /// Attach a live vendor feed for query-time freshness.
    pub fn with_feed(mut self, feed: Arc<dyn IncidentFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Currently relevant incidents inside the box, merged from both
    /// sources. Reads never mutate: a record past its expiry is filtered
    /// out, not touched.
    pub async fn incidents_in(
        &self,
        bbox: BoundingBox,
        type_filter: Option<IncidentType>,
    ) -> Result<MergedIncidents, RoadPulseError> {
        let now = Utc::now();

        let mut vendor: Vec<Incident> = self
            .repo
            .active_vendor_in_box(&bbox)
            .await?
            .into_iter()
            .filter(|r| r.is_relevant(now))
            .filter(|r| type_filter.is_none_or(|t| r.incident_type == t))
            .collect();

        if let Some(feed) = &self.feed {
            match feed.fetch(&bbox, LIVE_REFRESH_MAX_RESULTS).await {
                Ok(records) => {
                    for record in records {
                        let Some(point) = record.representative_point() else {
                            continue;
                        };
                        if !record.properties.active || !bbox.contains(point) {
                            continue;
                        }
                        let (incident_type, severity) = taxonomy::map_codes(
                            record.properties.icon_category,
                            record.properties.magnitude_of_delay,
                        );
                        if type_filter.is_some_and(|t| t != incident_type) {
                            continue;
                        }
                        // Already represented by a stored record.
                        if vendor
                            .iter()
                            .any(|r| r.incident_type == incident_type && r.location == point)
                        {
                            continue;
                        }
                        let expires_at = record
                            .properties
                            .end_time
                            .filter(|t| *t > now)
                            .unwrap_or(now + Duration::hours(1));
                        vendor.push(Incident::new_vendor(
                            incident_type,
                            severity,
                            point,
                            record.properties.description,
                            true,
                            expires_at,
                        ));
                    }
                }
                Err(e) => {
                    // Stale-but-valid data keeps flowing; the caller never
                    // sees a feed failure.
                    warn!(error = %e, "Live vendor refresh failed, serving stored records");
                }
            }
        }

        let user: Vec<Incident> = self
            .repo
            .user_reports(&ReportFilter {
                bbox: Some(bbox),
                incident_type: type_filter,
                ..Default::default()
            })
            .await?
            .into_iter()
            .filter(|r| r.is_relevant(now))
            .collect();

        vendor.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        // `user` arrives newest-first from the repo already.

        Ok(MergedIncidents { vendor, user })
    }

    /// User reports matching a filter, newest first. Without an explicit
    /// `active` filter the uniform relevance predicate applies; with one,
    /// the caller gets the administrative view (resolved and expired
    /// records included).
    pub async fn reports(&self, filter: ReportFilter) -> Result<Vec<Incident>, RoadPulseError> {
        let now = Utc::now();
        let explicit_active = filter.active.is_some();
        let reports = self.repo.user_reports(&filter).await?;

        if explicit_active {
            Ok(reports)
        } else {
            Ok(reports.into_iter().filter(|r| r.is_relevant(now)).collect())
        }
    }
}
