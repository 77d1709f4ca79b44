//! Null validation over the critical columns.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;

use cdp_model::report::round2;
use cdp_model::{CRITICAL_COLUMNS, CheckDetails, CheckName, CheckResult, CheckStatus, NullStats};

/// Ensure critical columns stay under the null-fraction threshold.
///
/// Per-column statistics are recorded regardless of outcome. Columns
/// absent from the dataset are skipped silently; schema validation is
/// responsible for flagging them.
pub fn null_validation(df: &DataFrame, threshold: f64) -> CheckResult {
    let total_rows = df.height();
    let mut null_report = BTreeMap::new();
    let mut has_critical_nulls = false;

    for column_name in CRITICAL_COLUMNS {
        let Ok(column) = df.column(column_name) else {
            continue;
        };
        let null_count = column.null_count() as u64;
        let null_percentage = if total_rows > 0 {
            null_count as f64 / total_rows as f64 * 100.0
        } else {
            0.0
        };
        // Gate on the exact fraction; the report carries the rounded value.
        if null_percentage > threshold * 100.0 {
            has_critical_nulls = true;
        }
        null_report.insert(
            column_name.to_string(),
            NullStats {
                null_count,
                null_percentage: round2(null_percentage),
                total_rows,
            },
        );
    }

    if has_critical_nulls {
        return CheckResult {
            check: CheckName::NullValidation,
            status: CheckStatus::Failed,
            message: format!(
                "Critical columns exceed the {}% null threshold",
                threshold * 100.0
            ),
            details: CheckDetails::NullCounts(null_report),
        };
    }

    CheckResult {
        check: CheckName::NullValidation,
        status: CheckStatus::Passed,
        message: "Null values within acceptable threshold".to_string(),
        details: CheckDetails::NullCounts(null_report),
    }
}
