//! HTTP client for the vendor traffic-incident feed.
//!
//! The feed is consumed as a black box: one GET per bounding box, returning
//! a collection of incident features. This crate also owns the taxonomy
//! translation from vendor codes into the internal vocabulary.

pub mod error;
pub mod taxonomy;
pub mod types;

pub use error::{Result, VendorFeedError};
pub use types::{FeedGeometry, FeedIncident, FeedProperties, FeedResponse};

use std::time::Duration;

use async_trait::async_trait;

use roadpulse_common::BoundingBox;

/// The seam between consumers (sync job, query service) and the live feed.
/// Tests script this with a stub; production uses [`VendorClient`].
#[async_trait]
pub trait IncidentFeed: Send + Sync {
    async fn fetch(&self, bbox: &BoundingBox, max_results: u32) -> Result<Vec<FeedIncident>>;
}

pub struct VendorClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VendorClient {
    /// Build a client with a hard request timeout so a slow feed cannot
    /// stall a sync tick indefinitely.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("HTTP client construction failed");
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl IncidentFeed for VendorClient {
    async fn fetch(&self, bbox: &BoundingBox, max_results: u32) -> Result<Vec<FeedIncident>> {
        let url = format!("{}/incidents", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .query(&[("bbox", bbox.to_string())])
            .query(&[("maxResults", max_results.to_string())])
            .query(&[("key", self.api_key.clone())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VendorFeedError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let feed: FeedResponse = resp.json().await?;
        Ok(feed.incidents)
    }
}
