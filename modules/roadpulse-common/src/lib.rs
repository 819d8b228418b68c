//! Shared configuration, error type, and domain vocabulary for RoadPulse.
//!
//! Everything here is consumed by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::RoadPulseError;
pub use types::{BoundingBox, GeoPoint, IncidentSource, IncidentType, Severity};
