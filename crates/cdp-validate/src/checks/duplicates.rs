//! Duplicate detection on the primary-key column.

use std::collections::HashMap;

use polars::prelude::DataFrame;

use cdp_model::report::round2;
use cdp_model::{CheckDetails, CheckName, CheckResult, CheckStatus};

use super::string_value;

const SAMPLE_LIMIT: usize = 5;

/// Count records whose primary-key value repeats an earlier occurrence.
///
/// Duplicates are surfaced as a WARNING, not a failure: the batch is
/// still usable, but a human should look. Null keys count as one shared
/// key value.
pub fn duplicate_detection(df: &DataFrame, primary_key: &str) -> CheckResult {
    let Ok(column) = df.column(primary_key) else {
        return CheckResult {
            check: CheckName::DuplicateDetection,
            status: CheckStatus::Failed,
            message: format!("Primary key column '{primary_key}' not found"),
            details: CheckDetails::None {},
        };
    };

    let total_rows = df.height();
    let mut counts: HashMap<Option<String>, u64> = HashMap::new();
    for idx in 0..total_rows {
        *counts.entry(string_value(column, idx)).or_default() += 1;
    }

    let duplicate_count = total_rows as u64 - counts.len() as u64;

    if duplicate_count > 0 {
        let duplicate_percentage = round2(duplicate_count as f64 / total_rows as f64 * 100.0);
        let sample_duplicates = sample_duplicates(df, primary_key, &counts);
        return CheckResult {
            check: CheckName::DuplicateDetection,
            status: CheckStatus::Warning,
            message: format!(
                "Found {duplicate_count} duplicate records ({duplicate_percentage:.2}%)"
            ),
            details: CheckDetails::Duplicates {
                duplicate_count,
                duplicate_percentage,
                total_rows,
                sample_duplicates,
            },
        };
    }

    CheckResult {
        check: CheckName::DuplicateDetection,
        status: CheckStatus::Passed,
        message: "No duplicate records found".to_string(),
        details: CheckDetails::NoDuplicates {
            duplicate_count: 0,
            total_rows,
        },
    }
}

/// Up to five distinct duplicated key values, in first-encountered order.
fn sample_duplicates(
    df: &DataFrame,
    primary_key: &str,
    counts: &HashMap<Option<String>, u64>,
) -> Vec<String> {
    let Ok(column) = df.column(primary_key) else {
        return Vec::new();
    };
    let mut samples = Vec::new();
    for idx in 0..df.height() {
        let Some(value) = string_value(column, idx) else {
            continue;
        };
        let repeated = counts.get(&Some(value.clone())).copied().unwrap_or(0) > 1;
        if repeated && !samples.contains(&value) {
            samples.push(value);
            if samples.len() == SAMPLE_LIMIT {
                break;
            }
        }
    }
    samples
}
