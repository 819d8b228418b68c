use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RoadPulseError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Incident not found: {0}")]
    NotFound(Uuid),

    #[error("Vendor feed error: {0}")]
    Feed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
