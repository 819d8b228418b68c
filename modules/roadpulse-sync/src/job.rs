//! The recurring vendor sync.
//!
//! Each tick fetches the feed for the coverage box and reconciles it into
//! the store: matched records get their active flag refreshed, unmatched
//! ones are inserted. Records absent from a tick's feed are left alone;
//! their own `expires_at` bounds staleness. A tick that is still running
//! when the next is due causes the next to be skipped, never queued.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use roadpulse_common::BoundingBox;
use roadpulse_incidents::{Incident, IncidentRepo};
use roadpulse_vendor::{taxonomy, IncidentFeed};

use crate::matcher::GeoMatcher;

/// Fallback validity horizon when the feed reports no end time.
const FALLBACK_EXPIRY_MINUTES: i64 = 60;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub fetched: usize,
    pub created: usize,
    pub refreshed: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct VendorSyncJob {
    feed: Arc<dyn IncidentFeed>,
    repo: Arc<dyn IncidentRepo>,
    matcher: Box<dyn GeoMatcher>,
    coverage: BoundingBox,
    max_results: u32,
    fetch_timeout: Duration,
    // Held for the duration of a tick; try_lock failure means skip.
    running: Mutex<()>,
}

impl VendorSyncJob {
    pub fn new(
        feed: Arc<dyn IncidentFeed>,
        repo: Arc<dyn IncidentRepo>,
        matcher: Box<dyn GeoMatcher>,
        coverage: BoundingBox,
        max_results: u32,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            feed,
            repo,
            matcher,
            coverage,
            max_results,
            fetch_timeout,
            running: Mutex::new(()),
        }
    }

    /// Run forever on a fixed interval. The first tick fires immediately.
    pub async fn run(self: Arc<Self>, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match self.tick().await {
                Ok(stats) => info!(
                    fetched = stats.fetched,
                    created = stats.created,
                    refreshed = stats.refreshed,
                    skipped = stats.skipped,
                    failed = stats.failed,
                    "Vendor sync tick complete"
                ),
                Err(e) => warn!(error = %e, "Vendor sync tick failed"),
            }
        }
    }

    /// One reconciliation pass. Public so tests (and an operator endpoint,
    /// if one is ever wanted) can drive ticks deterministically.
    pub async fn tick(&self) -> Result<SyncStats> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Previous sync tick still running, skipping this one");
            return Ok(SyncStats::default());
        };

        let mut stats = SyncStats::default();

        // Fetch failure is non-fatal: skip the tick, keep last-known-good
        // store state, no retry until the next interval.
        let records = match tokio::time::timeout(
            self.fetch_timeout,
            self.feed.fetch(&self.coverage, self.max_results),
        )
        .await
        {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                warn!(error = %e, "Vendor fetch failed, skipping tick");
                return Ok(stats);
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "Vendor fetch timed out, skipping tick"
                );
                return Ok(stats);
            }
        };
        stats.fetched = records.len();

        let mut active = self.repo.active_vendor_in_box(&self.coverage).await?;
        let now = Utc::now();

        for record in records {
            let Some(point) = record.representative_point() else {
                warn!("Feed record with unsupported geometry, skipping");
                stats.skipped += 1;
                continue;
            };

            let (incident_type, severity) = taxonomy::map_codes(
                record.properties.icon_category,
                record.properties.magnitude_of_delay,
            );

            match self.matcher.find_match(incident_type, point, &active) {
                Some(id) => {
                    // Stays active only while the feed says so AND the
                    // stored expiry is still in the future.
                    let stored_expiry = active
                        .iter()
                        .find(|c| c.id == id)
                        .map(|c| c.expires_at)
                        .unwrap_or(now);
                    let still_active = record.properties.active && stored_expiry > now;
                    match self.repo.set_active(id, still_active).await {
                        Ok(_) => stats.refreshed += 1,
                        Err(e) => {
                            warn!(error = %e, %id, "Failed to refresh vendor incident");
                            stats.failed += 1;
                        }
                    }
                }
                None => {
                    // An unmatched record the feed already reports inactive
                    // would be invisible to queries and, being inactive,
                    // could never match on later ticks; inserting it every
                    // tick would grow the store without bound.
                    if !record.properties.active {
                        stats.skipped += 1;
                        continue;
                    }
                    let expires_at = record
                        .properties
                        .end_time
                        .filter(|t| *t > now)
                        .unwrap_or(now + chrono::Duration::minutes(FALLBACK_EXPIRY_MINUTES));
                    let incident = Incident::new_vendor(
                        incident_type,
                        severity,
                        point,
                        record.properties.description.clone(),
                        record.properties.active,
                        expires_at,
                    );
                    match self.repo.insert(&incident).await {
                        Ok(()) => {
                            stats.created += 1;
                            // Keep the in-tick view current so a duplicate
                            // row later in the same feed matches instead of
                            // inserting a second active record.
                            active.push(incident);
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to insert vendor incident");
                            stats.failed += 1;
                        }
                    }
                }
            }
        }

        Ok(stats)
    }
}
