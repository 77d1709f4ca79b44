//! The data-quality validation engine.
//!
//! Runs a fixed battery of checks against a commit dataset and produces
//! a categorized [`ValidationReport`](cdp_model::ValidationReport). The
//! engine neither loads nor mutates data; callers hand it a `DataFrame`
//! snapshot and decide what to do with the report.

pub mod checks;
mod engine;
pub mod error;

pub use engine::{DEFAULT_MIN_ROWS, DEFAULT_NULL_THRESHOLD, ValidationEngine, summary_line};
pub use error::{Result, ValidateError};

use std::path::{Path, PathBuf};

use serde::Serialize;

use cdp_model::ValidationReport;

const REPORT_SCHEMA: &str = "commit-data-platform.validation-report";
const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct ValidationReportPayload<'a> {
    schema: &'static str,
    schema_version: u32,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

/// Write the report as pretty JSON for auditing.
pub fn write_validation_report_json(
    output_path: &Path,
    report: &ValidationReport,
) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let payload = ValidationReportPayload {
        schema: REPORT_SCHEMA,
        schema_version: REPORT_SCHEMA_VERSION,
        report,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    std::fs::write(output_path, format!("{json}\n"))?;
    Ok(output_path.to_path_buf())
}
