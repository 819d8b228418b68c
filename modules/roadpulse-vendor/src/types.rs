//! Wire types for the vendor traffic feed.
//!
//! The feed returns a collection of incident features for a bounding box.
//! Each feature carries a geometry, an icon category code, a magnitude code,
//! optional free text, optional validity timestamps, and an active flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roadpulse_common::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub incidents: Vec<FeedIncident>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedIncident {
    pub geometry: FeedGeometry,
    pub properties: FeedProperties,
}

/// Feed geometries. Anything beyond Point/LineString is carried as `Other`
/// so a single exotic feature cannot fail deserialization of the whole tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeedGeometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedProperties {
    pub icon_category: i32,
    pub magnitude_of_delay: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl FeedIncident {
    /// The representative point: a `Point` coordinate, or the first vertex of
    /// a `LineString`. `None` for unsupported geometries and empty lines.
    pub fn representative_point(&self) -> Option<GeoPoint> {
        match &self.geometry {
            FeedGeometry::Point { coordinates } => {
                Some(GeoPoint::new(coordinates[0], coordinates[1]))
            }
            FeedGeometry::LineString { coordinates } => coordinates
                .first()
                .map(|c| GeoPoint::new(c[0], c[1])),
            FeedGeometry::Other => None,
        }
    }
}
