//! The incident store and the services built on top of it.
//!
//! `IncidentRepo` is the storage seam: a Postgres implementation for
//! production and an in-memory implementation used by tests and small
//! deployments. `UserReportService` and `QueryService` hold the mutation
//! and read rules; HTTP handlers stay thin.

pub mod incident;
pub mod mem;
pub mod pg;
pub mod query;
pub mod reports;
pub mod repo;

pub use incident::{Incident, INVALIDATION_THRESHOLD};
pub use mem::MemoryIncidentStore;
pub use pg::PgIncidentStore;
pub use query::{MergedIncidents, QueryService};
pub use reports::{NewReport, UserReportService};
pub use repo::{IncidentRepo, ReportFilter};
