use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransformError {
    #[error(transparent)]
    Store(#[from] cdp_store::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] polars::error::PolarsError),

    /// The object store holds no staged batch under the ingest prefix.
    #[error("no raw data found under prefix '{0}'")]
    NoRawData(String),
}

pub type Result<T> = std::result::Result<T, TransformError>;
