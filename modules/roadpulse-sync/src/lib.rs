//! Vendor feed reconciliation: the GeoMatcher and the recurring sync job.

pub mod job;
pub mod matcher;

pub use job::{SyncStats, VendorSyncJob};
pub use matcher::{ExactMatcher, GeoMatcher};
