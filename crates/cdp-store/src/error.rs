use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] polars::error::PolarsError),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("frame does not match the warehouse schema: {0}")]
    InvalidFrame(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
