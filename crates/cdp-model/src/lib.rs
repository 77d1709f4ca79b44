//! Shared domain types for the commit data platform.

pub mod columns;
pub mod quality;
pub mod report;

pub use columns::{COMMITS_PRIMARY_KEY, CRITICAL_COLUMNS, REQUIRED_COLUMNS};
pub use quality::{CheckDetails, CheckName, CheckResult, CheckStatus, FailedCheck, NullStats};
pub use report::{ReportSummary, RunResults, ValidationReport};
