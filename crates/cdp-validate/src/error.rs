use thiserror::Error;

use cdp_model::FailedCheck;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidateError {
    /// One or more checks FAILED and fail-fast was requested. Downstream
    /// stages must not run.
    #[error("data quality validation failed: {}", summarize(failures))]
    QualityGate { failures: Vec<FailedCheck> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn summarize(failures: &[FailedCheck]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ValidateError>;
