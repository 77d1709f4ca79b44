//! Error types for the ingestion stage.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success response from the API.
    #[error("GitHub API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// GitHub API rate limit exceeded.
    #[error("GitHub API rate limit exceeded, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] cdp_store::StoreError),

    /// Every configured repository failed or returned nothing.
    #[error("no commits fetched from any repository")]
    NoData,
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
