//! Data-quality check results.

use std::collections::BTreeMap;

use serde::Serialize;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Passed,
    Failed,
    Warning,
}

/// The closed set of checks the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    SchemaValidation,
    NullValidation,
    DuplicateDetection,
    RowCountValidation,
}

impl CheckName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SchemaValidation => "schema_validation",
            Self::NullValidation => "null_validation",
            Self::DuplicateDetection => "duplicate_detection",
            Self::RowCountValidation => "row_count_validation",
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column null statistics recorded by the null check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NullStats {
    pub null_count: u64,
    pub null_percentage: f64,
    pub total_rows: usize,
}

/// Check-specific structured detail, one shape per check outcome.
///
/// Serialized untagged so the JSON report mirrors the shapes consumers
/// already expect (`missing`, `type_errors`, per-column maps, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckDetails {
    MissingColumns {
        expected_columns: Vec<String>,
        actual_columns: Vec<String>,
        missing: Vec<String>,
    },
    TypeErrors {
        type_errors: Vec<String>,
    },
    ValidatedColumns {
        validated_columns: Vec<String>,
    },
    NullCounts(BTreeMap<String, NullStats>),
    Duplicates {
        duplicate_count: u64,
        duplicate_percentage: f64,
        total_rows: usize,
        sample_duplicates: Vec<String>,
    },
    NoDuplicates {
        duplicate_count: u64,
        total_rows: usize,
    },
    RowCount {
        actual_rows: usize,
        minimum_required: usize,
    },
    None {},
}

/// Result of one check run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub check: CheckName,
    pub status: CheckStatus,
    pub message: String,
    pub details: CheckDetails,
}

impl CheckResult {
    /// Whether this result counts as passing for the fail-fast gate.
    /// Warnings pass; only FAILED gates.
    pub fn is_gate_pass(&self) -> bool {
        self.status != CheckStatus::Failed
    }
}

/// Summary of a failed check, carried by the quality-gate error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedCheck {
    pub check: CheckName,
    pub message: String,
}

impl std::fmt::Display for FailedCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.check, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&CheckStatus::Passed).unwrap(),
            "\"PASSED\""
        );
        assert_eq!(
            serde_json::to_string(&CheckStatus::Failed).unwrap(),
            "\"FAILED\""
        );
        assert_eq!(
            serde_json::to_string(&CheckStatus::Warning).unwrap(),
            "\"WARNING\""
        );
    }

    #[test]
    fn check_name_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CheckName::SchemaValidation).unwrap(),
            "\"schema_validation\""
        );
        assert_eq!(CheckName::DuplicateDetection.as_str(), "duplicate_detection");
    }

    #[test]
    fn details_serialize_flat() {
        let details = CheckDetails::RowCount {
            actual_rows: 5,
            minimum_required: 10,
        };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["actual_rows"], 5);
        assert_eq!(value["minimum_required"], 10);
    }

    #[test]
    fn warning_is_gate_pass() {
        let result = CheckResult {
            check: CheckName::DuplicateDetection,
            status: CheckStatus::Warning,
            message: "dupes".to_string(),
            details: CheckDetails::None {},
        };
        assert!(result.is_gate_pass());
    }
}
