//! Integration tests for PgIncidentStore.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::Duration;
use sqlx::PgPool;

use roadpulse_common::{BoundingBox, GeoPoint, IncidentType, RoadPulseError, Severity};
use roadpulse_incidents::{Incident, IncidentRepo, PgIncidentStore, ReportFilter};

/// Get a migrated test store, or skip if no test DB is available.
async fn test_store() -> Option<PgIncidentStore> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let store = PgIncidentStore::new(pool);
    store.migrate().await.ok()?;
    Some(store)
}

fn report() -> Incident {
    Incident::new_report(
        IncidentType::Accident,
        Severity::Moderate,
        GeoPoint::new(2.35, 48.85),
        Some("pileup near exit 4".into()),
        Duration::minutes(60),
        Some("reporter-pg".into()),
    )
}

#[tokio::test]
async fn insert_get_round_trip() {
    let Some(store) = test_store().await else {
        return;
    };

    let incident = report();
    store.insert(&incident).await.unwrap();

    let loaded = store.get(incident.id).await.unwrap().unwrap();
    assert_eq!(loaded.incident_type, IncidentType::Accident);
    assert_eq!(loaded.location, incident.location);
    assert_eq!(loaded.description, "pileup near exit 4");
    assert_eq!(loaded.reporter_id.as_deref(), Some("reporter-pg"));
    assert_eq!(loaded.invalidations, Some(0));
}

#[tokio::test]
async fn conditional_update_flips_at_threshold() {
    let Some(store) = test_store().await else {
        return;
    };

    let incident = report();
    store.insert(&incident).await.unwrap();

    let one = store.record_invalidation(incident.id).await.unwrap();
    assert!(one.active);
    let two = store.record_invalidation(incident.id).await.unwrap();
    assert!(two.active);
    let three = store.record_invalidation(incident.id).await.unwrap();
    assert!(!three.active);
    assert_eq!(three.invalidations, Some(3));

    // Further votes keep it inactive.
    let four = store.record_invalidation(incident.id).await.unwrap();
    assert!(!four.active);
}

#[tokio::test]
async fn vote_on_vendor_record_is_not_found() {
    let Some(store) = test_store().await else {
        return;
    };

    let vendor = Incident::new_vendor(
        IncidentType::Congestion,
        Severity::Low,
        GeoPoint::new(2.31, 48.84),
        None,
        true,
        chrono::Utc::now() + Duration::hours(1),
    );
    store.insert(&vendor).await.unwrap();

    assert!(matches!(
        store.record_invalidation(vendor.id).await.unwrap_err(),
        RoadPulseError::NotFound(_)
    ));
}

#[tokio::test]
async fn spatial_and_reporter_filters() {
    let Some(store) = test_store().await else {
        return;
    };

    let reporter = format!("reporter-{}", uuid::Uuid::new_v4());
    let mut inside = report();
    inside.reporter_id = Some(reporter.clone());
    store.insert(&inside).await.unwrap();

    let mut outside = report();
    outside.reporter_id = Some(reporter.clone());
    outside.location = GeoPoint::new(10.0, 50.0);
    store.insert(&outside).await.unwrap();

    let found = store
        .user_reports(&ReportFilter {
            bbox: Some(BoundingBox::parse("2.2,48.8,2.5,48.9").unwrap()),
            reporter_id: Some(reporter),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, inside.id);
}
