//! Minimum row count validation.

use polars::prelude::DataFrame;

use cdp_model::{CheckDetails, CheckName, CheckResult, CheckStatus};

/// Ensure the dataset carries at least `min_rows` rows.
pub fn row_count_validation(df: &DataFrame, min_rows: usize) -> CheckResult {
    let actual_rows = df.height();
    let details = CheckDetails::RowCount {
        actual_rows,
        minimum_required: min_rows,
    };

    if actual_rows < min_rows {
        return CheckResult {
            check: CheckName::RowCountValidation,
            status: CheckStatus::Failed,
            message: format!("Insufficient rows: {actual_rows} < {min_rows} (minimum)"),
            details,
        };
    }

    CheckResult {
        check: CheckName::RowCountValidation,
        status: CheckStatus::Passed,
        message: format!("Row count meets minimum requirement: {actual_rows} >= {min_rows}"),
        details,
    }
}
