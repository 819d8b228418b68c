//! Reconciliation tests for VendorSyncJob against the in-memory store and
//! a scripted feed.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use roadpulse_common::{BoundingBox, GeoPoint, IncidentType, Severity};
use roadpulse_incidents::{Incident, IncidentRepo, MemoryIncidentStore};
use roadpulse_sync::{ExactMatcher, VendorSyncJob};
use roadpulse_vendor::{
    FeedGeometry, FeedIncident, FeedProperties, IncidentFeed, Result as FeedResult,
    VendorFeedError,
};

// --- Scripted feed ---

struct ScriptedFeed {
    responses: Mutex<VecDeque<FeedResult<Vec<FeedIncident>>>>,
}

impl ScriptedFeed {
    fn new(responses: Vec<FeedResult<Vec<FeedIncident>>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl IncidentFeed for ScriptedFeed {
    async fn fetch(&self, _bbox: &BoundingBox, _max: u32) -> FeedResult<Vec<FeedIncident>> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A feed that never answers inside the job's timeout.
struct HangingFeed;

#[async_trait]
impl IncidentFeed for HangingFeed {
    async fn fetch(&self, _bbox: &BoundingBox, _max: u32) -> FeedResult<Vec<FeedIncident>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

// --- Fixtures ---

fn coverage() -> BoundingBox {
    BoundingBox::parse("2.2,48.8,2.5,48.9").unwrap()
}

fn job(feed: Arc<dyn IncidentFeed>, repo: Arc<MemoryIncidentStore>) -> VendorSyncJob {
    VendorSyncJob::new(
        feed,
        repo,
        Box::new(ExactMatcher),
        coverage(),
        200,
        Duration::from_millis(200),
    )
}

fn point_incident(category: i32, lon: f64, lat: f64) -> FeedIncident {
    FeedIncident {
        geometry: FeedGeometry::Point {
            coordinates: [lon, lat],
        },
        properties: FeedProperties {
            icon_category: category,
            magnitude_of_delay: 2,
            description: None,
            start_time: None,
            end_time: None,
            active: true,
        },
    }
}

// --- Tests ---

#[tokio::test]
async fn two_identical_ticks_leave_one_record() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let accident = point_incident(1, 2.35, 48.85);
    let feed = ScriptedFeed::new(vec![
        Ok(vec![accident.clone()]),
        Ok(vec![accident]),
    ]);
    let job = job(feed, repo.clone());

    let first = job.tick().await.unwrap();
    assert_eq!(first.created, 1);

    let stored_after_first = repo.active_vendor_in_box(&coverage()).await.unwrap();
    let original = stored_after_first[0].clone();
    assert_eq!(original.incident_type, IncidentType::Accident);

    let second = job.tick().await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.refreshed, 1);

    let stored_after_second = repo.active_vendor_in_box(&coverage()).await.unwrap();
    assert_eq!(stored_after_second.len(), 1, "no duplicate inserted");
    assert_eq!(
        stored_after_second[0].created_at, original.created_at,
        "refresh must not touch created_at"
    );
}

#[tokio::test]
async fn linestring_reduces_to_first_vertex() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let jam = FeedIncident {
        geometry: FeedGeometry::LineString {
            coordinates: vec![[2.30, 48.86], [2.31, 48.87], [2.32, 48.88]],
        },
        properties: FeedProperties {
            icon_category: 6,
            magnitude_of_delay: 3,
            description: Some("slow traffic on the ring".into()),
            start_time: None,
            end_time: None,
            active: true,
        },
    };
    let job = job(ScriptedFeed::new(vec![Ok(vec![jam])]), repo.clone());

    job.tick().await.unwrap();

    let stored = repo.active_vendor_in_box(&coverage()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].location, GeoPoint::new(2.30, 48.86));
    assert_eq!(stored[0].incident_type, IncidentType::Congestion);
    assert_eq!(stored[0].severity, Severity::High);
    assert_eq!(stored[0].description, "slow traffic on the ring");
}

#[tokio::test]
async fn unsupported_geometry_is_skipped_not_fatal() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let polygon = FeedIncident {
        geometry: FeedGeometry::Other,
        properties: FeedProperties {
            icon_category: 8,
            magnitude_of_delay: 4,
            description: None,
            start_time: None,
            end_time: None,
            active: true,
        },
    };
    let feed = ScriptedFeed::new(vec![Ok(vec![polygon, point_incident(9, 2.4, 48.85)])]);
    let job = job(feed, repo.clone());

    let stats = job.tick().await.unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.created, 1, "remaining records still processed");

    let stored = repo.active_vendor_in_box(&coverage()).await.unwrap();
    assert_eq!(stored[0].incident_type, IncidentType::Roadworks);
}

#[tokio::test]
async fn fetch_failure_leaves_store_unchanged() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let existing = Incident::new_vendor(
        IncidentType::Accident,
        Severity::Moderate,
        GeoPoint::new(2.35, 48.85),
        None,
        true,
        Utc::now() + chrono::Duration::hours(1),
    );
    repo.insert(&existing).await.unwrap();

    let feed = ScriptedFeed::new(vec![Err(VendorFeedError::Api {
        status: 503,
        message: "upstream unavailable".into(),
    })]);
    let job = job(feed, repo.clone());

    let stats = job.tick().await.unwrap();
    assert_eq!(stats.fetched, 0);
    assert_eq!(stats.created + stats.refreshed + stats.failed, 0);

    let stored = repo.get(existing.id).await.unwrap().unwrap();
    assert_eq!(stored.updated_at, existing.updated_at);
}

#[tokio::test]
async fn slow_fetch_is_abandoned_on_timeout() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let job = job(Arc::new(HangingFeed), repo.clone());

    let stats = job.tick().await.unwrap();
    assert_eq!(stats.fetched, 0);
    assert!(repo.active_vendor_in_box(&coverage()).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_end_time_gets_fallback_horizon() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let job = job(
        ScriptedFeed::new(vec![Ok(vec![point_incident(1, 2.35, 48.85)])]),
        repo.clone(),
    );

    let before = Utc::now();
    job.tick().await.unwrap();

    let stored = repo.active_vendor_in_box(&coverage()).await.unwrap();
    let expected = before + chrono::Duration::hours(1);
    let delta = (stored[0].expires_at - expected).num_seconds().abs();
    assert!(delta < 5, "fallback expiry should be one hour out");
}

#[tokio::test]
async fn feed_end_time_becomes_expiry() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let end = Utc::now() + chrono::Duration::hours(3);
    let mut incident = point_incident(8, 2.35, 48.85);
    incident.properties.end_time = Some(end);
    let job = job(ScriptedFeed::new(vec![Ok(vec![incident])]), repo.clone());

    job.tick().await.unwrap();

    let stored = repo.active_vendor_in_box(&coverage()).await.unwrap();
    assert_eq!(stored[0].expires_at, end);
}

#[tokio::test]
async fn matched_record_past_expiry_is_deactivated() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let mut stale = Incident::new_vendor(
        IncidentType::Accident,
        Severity::Moderate,
        GeoPoint::new(2.35, 48.85),
        None,
        true,
        Utc::now() + chrono::Duration::hours(1),
    );
    stale.expires_at = Utc::now() - chrono::Duration::minutes(10);
    repo.insert(&stale).await.unwrap();

    // The feed still reports it active, but the stored expiry has passed:
    // both must hold for the record to stay active.
    let job = job(
        ScriptedFeed::new(vec![Ok(vec![point_incident(1, 2.35, 48.85)])]),
        repo.clone(),
    );
    let stats = job.tick().await.unwrap();
    assert_eq!(stats.refreshed, 1);

    let stored = repo.get(stale.id).await.unwrap().unwrap();
    assert!(!stored.active);
}

#[tokio::test]
async fn duplicate_rows_in_one_feed_do_not_duplicate_records() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let row = point_incident(1, 2.35, 48.85);
    let job = job(
        ScriptedFeed::new(vec![Ok(vec![row.clone(), row])]),
        repo.clone(),
    );

    let stats = job.tick().await.unwrap();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.refreshed, 1);
    assert_eq!(repo.active_vendor_in_box(&coverage()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn inactive_feed_records_are_not_inserted_across_ticks() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let mut cleared = point_incident(1, 2.35, 48.85);
    cleared.properties.active = false;

    // The same already-inactive row on consecutive ticks: it can never
    // match (only active records are scanned), so inserting it would add
    // a duplicate every tick.
    let feed = ScriptedFeed::new(vec![Ok(vec![cleared.clone()]), Ok(vec![cleared])]);
    let job = job(feed, repo.clone());

    let first = job.tick().await.unwrap();
    assert_eq!(first.created, 0);
    assert_eq!(first.skipped, 1);

    let second = job.tick().await.unwrap();
    assert_eq!(second.created, 0, "identical tick must not create records");
    assert_eq!(second.skipped, 1);

    assert!(repo.active_vendor_in_box(&coverage()).await.unwrap().is_empty());
}

#[tokio::test]
async fn user_reports_are_untouched_by_sync() {
    let repo = Arc::new(MemoryIncidentStore::new());
    let report = Incident::new_report(
        IncidentType::Accident,
        Severity::Moderate,
        GeoPoint::new(2.35, 48.85),
        None,
        chrono::Duration::minutes(60),
        Some("reporter-1".into()),
    );
    repo.insert(&report).await.unwrap();

    // Feed sends a vendor accident at the same point; it must not match the
    // user report.
    let job = job(
        ScriptedFeed::new(vec![Ok(vec![point_incident(1, 2.35, 48.85)])]),
        repo.clone(),
    );
    let stats = job.tick().await.unwrap();
    assert_eq!(stats.created, 1);

    let stored = repo.get(report.id).await.unwrap().unwrap();
    assert_eq!(stored.validations, Some(0));
    assert_eq!(stored.invalidations, Some(0));
    assert_eq!(stored.updated_at, report.updated_at);
}
