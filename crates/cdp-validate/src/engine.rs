//! The engine: fixed check order, per-run state, fail-fast gating.

use polars::prelude::DataFrame;

use cdp_model::{
    COMMITS_PRIMARY_KEY, CheckResult, CheckStatus, ReportSummary, RunResults, ValidationReport,
};

use crate::checks::{duplicate_detection, null_validation, row_count_validation, schema_validation};
use crate::error::{Result, ValidateError};

/// Default null-fraction threshold for critical columns.
pub const DEFAULT_NULL_THRESHOLD: f64 = 0.05;

/// Default minimum row count.
pub const DEFAULT_MIN_ROWS: usize = 10;

/// Runs the check battery against one dataset snapshot.
///
/// The engine holds configuration only. Run state lives inside each
/// invocation, so a single engine value can serve repeated or concurrent
/// runs without results leaking between them.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    null_threshold: f64,
    min_rows: usize,
    primary_key: String,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self {
            null_threshold: DEFAULT_NULL_THRESHOLD,
            min_rows: DEFAULT_MIN_ROWS,
            primary_key: COMMITS_PRIMARY_KEY.to_string(),
        }
    }
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_null_threshold(mut self, threshold: f64) -> Self {
        self.null_threshold = threshold;
        self
    }

    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows;
        self
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Run all four checks in fixed order and derive the report.
    ///
    /// Checks never abort on earlier failure; a structurally broken
    /// dataset still gets the full battery (later checks tolerate absent
    /// columns).
    pub fn execute(&self, df: &DataFrame) -> ValidationReport {
        tracing::info!(rows = df.height(), "starting data quality validation");

        let mut results = RunResults::new();
        let battery = [
            schema_validation(df),
            null_validation(df, self.null_threshold),
            duplicate_detection(df, &self.primary_key),
            row_count_validation(df, self.min_rows),
        ];
        for result in battery {
            log_result(&result);
            results.record(result);
        }

        let report = ValidationReport::from_results(results);
        log_summary(&report.summary);
        report
    }

    /// Execute, then gate: with failures and `fail_on_error` the run ends
    /// in [`ValidateError::QualityGate`] carrying the failed-check
    /// summaries, and dependent stages must not run. Without fail-fast
    /// the report is returned and `report.passed()` carries the verdict.
    pub fn run(&self, df: &DataFrame, fail_on_error: bool) -> Result<ValidationReport> {
        let report = self.execute(df);

        if report.passed() {
            tracing::info!("data quality validation passed");
            return Ok(report);
        }

        let failures = report.failed_checks();
        for failure in &failures {
            tracing::error!(check = %failure.check, "{}", failure.message);
        }
        if fail_on_error {
            tracing::error!("data quality validation failed, stopping pipeline");
            return Err(ValidateError::QualityGate { failures });
        }
        tracing::warn!("data quality validation completed with failures");
        Ok(report)
    }
}

fn log_result(result: &CheckResult) {
    match result.status {
        CheckStatus::Passed => {
            tracing::info!(check = %result.check, "{}", result.message);
        }
        CheckStatus::Warning => {
            tracing::warn!(check = %result.check, "{}", result.message);
        }
        CheckStatus::Failed => {
            tracing::error!(check = %result.check, "{}", result.message);
        }
    }
}

fn log_summary(summary: &ReportSummary) {
    tracing::info!(
        total_checks = summary.total_checks,
        passed = summary.passed,
        failed = summary.failed,
        warnings = summary.warnings,
        success_rate = summary.success_rate,
        "validation summary"
    );
}

/// One-line summary for logs and snapshot-friendly output.
pub fn summary_line(report: &ValidationReport) -> String {
    format!(
        "checks={} passed={} failed={} warnings={} success_rate={:.2}%",
        report.summary.total_checks,
        report.summary.passed,
        report.summary.failed,
        report.summary.warnings,
        report.summary.success_rate
    )
}
