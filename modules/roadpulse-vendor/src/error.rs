use thiserror::Error;

pub type Result<T> = std::result::Result<T, VendorFeedError>;

#[derive(Debug, Error)]
pub enum VendorFeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Feed error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for VendorFeedError {
    fn from(err: reqwest::Error) -> Self {
        VendorFeedError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for VendorFeedError {
    fn from(err: serde_json::Error) -> Self {
        VendorFeedError::Parse(err.to_string())
    }
}
