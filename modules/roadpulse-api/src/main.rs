use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roadpulse_common::Config;
use roadpulse_incidents::{
    IncidentRepo, PgIncidentStore, QueryService, UserReportService,
};
use roadpulse_sync::{ExactMatcher, VendorSyncJob};
use roadpulse_vendor::{IncidentFeed, VendorClient};

mod rest;

pub struct AppState {
    pub query: QueryService,
    pub reports: UserReportService,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("roadpulse=info".parse()?))
        .init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url).await?;
    let store = PgIncidentStore::new(pool);
    store.migrate().await?;
    let repo: Arc<dyn IncidentRepo> = Arc::new(store);

    let feed: Arc<dyn IncidentFeed> = Arc::new(VendorClient::new(
        config.vendor_base_url.clone(),
        config.vendor_api_key.clone(),
        Duration::from_secs(config.vendor_timeout_secs),
    ));

    // Recurring vendor sync on its own task, independent of request handling.
    let sync_job = Arc::new(VendorSyncJob::new(
        feed.clone(),
        repo.clone(),
        Box::new(ExactMatcher),
        config.coverage_bbox,
        config.vendor_max_results,
        Duration::from_secs(config.vendor_timeout_secs),
    ));
    tokio::spawn(sync_job.run(Duration::from_secs(config.sync_interval_secs)));

    let state = Arc::new(AppState {
        query: QueryService::new(repo.clone()).with_feed(feed),
        reports: UserReportService::new(repo),
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Merged map view
        .route("/incidents", get(rest::api_incidents))
        // User reports
        .route("/reports", get(rest::api_reports))
        .route("/report", post(rest::api_submit_report))
        .route("/validate/{id}", post(rest::api_validate))
        .route("/invalidate/{id}", post(rest::api_invalidate))
        .route("/resolve/{id}", patch(rest::api_resolve))
        .with_state(state)
        // CORS: map clients are served from other origins
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("RoadPulse API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
