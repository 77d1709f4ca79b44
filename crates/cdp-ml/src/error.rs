use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MlError {
    #[error(transparent)]
    Store(#[from] cdp_store::StoreError),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] polars::error::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("tracking server error ({status}): {body}")]
    Tracking { status: u16, body: String },

    #[error("training error: {0}")]
    Training(String),
}

impl From<reqwest::Error> for MlError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MlError>;
