//! Validation run state and the derived report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::quality::{CheckResult, CheckStatus, FailedCheck};

/// Accumulated results of one engine invocation, bucketed by status.
///
/// Created empty per run and owned by that run exclusively; the engine
/// never holds one across invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResults {
    pub passed: Vec<CheckResult>,
    pub failed: Vec<CheckResult>,
    pub warnings: Vec<CheckResult>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a result into the bucket matching its status.
    pub fn record(&mut self, result: CheckResult) {
        match result.status {
            CheckStatus::Passed => self.passed.push(result),
            CheckStatus::Failed => self.failed.push(result),
            CheckStatus::Warning => self.warnings.push(result),
        }
    }

    pub fn total_checks(&self) -> usize {
        self.passed.len() + self.failed.len() + self.warnings.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn failed_checks(&self) -> Vec<FailedCheck> {
        self.failed
            .iter()
            .map(|result| FailedCheck {
                check: result.check,
                message: result.message.clone(),
            })
            .collect()
    }
}

/// Count-per-status summary plus the success rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    /// passed / total x 100, rounded to 2 decimals; 0 when no checks ran.
    pub success_rate: f64,
}

/// The full report for one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub summary: ReportSummary,
    pub results: RunResults,
    pub timestamp: DateTime<Utc>,
}

impl ValidationReport {
    /// Derive the report from a finished run's results.
    pub fn from_results(results: RunResults) -> Self {
        let total_checks = results.total_checks();
        let success_rate = if total_checks > 0 {
            round2(results.passed.len() as f64 / total_checks as f64 * 100.0)
        } else {
            0.0
        };
        let summary = ReportSummary {
            total_checks,
            passed: results.passed.len(),
            failed: results.failed.len(),
            warnings: results.warnings.len(),
            success_rate,
        };
        Self {
            summary,
            results,
            timestamp: Utc::now(),
        }
    }

    /// Overall pass signal: no FAILED checks. Warnings do not affect it.
    pub fn passed(&self) -> bool {
        !self.results.has_failures()
    }

    pub fn failed_checks(&self) -> Vec<FailedCheck> {
        self.results.failed_checks()
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{CheckDetails, CheckName};

    fn result(check: CheckName, status: CheckStatus) -> CheckResult {
        CheckResult {
            check,
            status,
            message: String::new(),
            details: CheckDetails::None {},
        }
    }

    #[test]
    fn record_routes_by_status() {
        let mut results = RunResults::new();
        results.record(result(CheckName::SchemaValidation, CheckStatus::Passed));
        results.record(result(CheckName::NullValidation, CheckStatus::Failed));
        results.record(result(CheckName::DuplicateDetection, CheckStatus::Warning));
        assert_eq!(results.passed.len(), 1);
        assert_eq!(results.failed.len(), 1);
        assert_eq!(results.warnings.len(), 1);
        assert_eq!(results.total_checks(), 3);
        assert!(results.has_failures());
    }

    #[test]
    fn success_rate_is_rounded() {
        let mut results = RunResults::new();
        results.record(result(CheckName::SchemaValidation, CheckStatus::Passed));
        results.record(result(CheckName::NullValidation, CheckStatus::Passed));
        results.record(result(CheckName::RowCountValidation, CheckStatus::Failed));
        let report = ValidationReport::from_results(results);
        // 2/3 = 66.666... -> 66.67
        assert_eq!(report.summary.success_rate, 66.67);
        assert!(!report.passed());
    }

    #[test]
    fn empty_run_has_zero_success_rate() {
        let report = ValidationReport::from_results(RunResults::new());
        assert_eq!(report.summary.total_checks, 0);
        assert_eq!(report.summary.success_rate, 0.0);
        assert!(report.passed());
    }

    #[test]
    fn failed_checks_carry_name_and_message() {
        let mut results = RunResults::new();
        results.record(CheckResult {
            check: CheckName::SchemaValidation,
            status: CheckStatus::Failed,
            message: "missing columns".to_string(),
            details: CheckDetails::None {},
        });
        let failed = results.failed_checks();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].check, CheckName::SchemaValidation);
        assert_eq!(failed[0].to_string(), "schema_validation: missing columns");
    }
}
