//! Schema validation: required columns and data types.

use std::sync::LazyLock;

use polars::prelude::{AnyValue, DataFrame, DataType};
use regex::Regex;

use cdp_model::{CheckDetails, CheckName, CheckResult, CheckStatus, REQUIRED_COLUMNS};

static SHA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{40}$").expect("valid SHA pattern"));

/// Verify the dataset conforms to the commit column contract.
///
/// Missing columns fail immediately with the exact missing subset. With
/// all columns present, type validation runs: SHA format per value, date
/// columns by dtype, `comment_count` by dtype. Any collected type error
/// fails the check.
pub fn schema_validation(df: &DataFrame) -> CheckResult {
    let actual_columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !actual_columns.iter().any(|actual| actual == *column))
        .map(|column| (*column).to_string())
        .collect();

    if !missing.is_empty() {
        return CheckResult {
            check: CheckName::SchemaValidation,
            status: CheckStatus::Failed,
            message: format!("Missing required columns: {missing:?}"),
            details: CheckDetails::MissingColumns {
                expected_columns: REQUIRED_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
                actual_columns,
                missing,
            },
        };
    }

    let mut type_errors = Vec::new();

    let invalid_shas = count_invalid_shas(df);
    if invalid_shas > 0 {
        type_errors.push(format!("{invalid_shas} invalid SHA hashes"));
    }

    for date_column in ["author_date", "committer_date"] {
        if !is_datetime_column(df, date_column) {
            type_errors.push(format!("{date_column} is not datetime type"));
        }
    }

    if !is_numeric_column(df, "comment_count") {
        type_errors.push("comment_count is not numeric type".to_string());
    }

    if !type_errors.is_empty() {
        return CheckResult {
            check: CheckName::SchemaValidation,
            status: CheckStatus::Failed,
            message: format!("Data type validation errors: {type_errors:?}"),
            details: CheckDetails::TypeErrors { type_errors },
        };
    }

    CheckResult {
        check: CheckName::SchemaValidation,
        status: CheckStatus::Passed,
        message: "All required columns present with correct types".to_string(),
        details: CheckDetails::ValidatedColumns {
            validated_columns: REQUIRED_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
        },
    }
}

/// Values that are null or do not match `^[a-f0-9]{40}$` count as invalid.
fn count_invalid_shas(df: &DataFrame) -> usize {
    let Ok(column) = df.column("commit_sha") else {
        return 0;
    };
    let mut invalid = 0usize;
    for idx in 0..df.height() {
        let matches = match column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::String(s) => SHA_PATTERN.is_match(s),
            AnyValue::StringOwned(ref s) => SHA_PATTERN.is_match(s),
            _ => false,
        };
        if !matches {
            invalid += 1;
        }
    }
    invalid
}

fn is_datetime_column(df: &DataFrame, name: &str) -> bool {
    df.column(name)
        .map(|column| matches!(column.dtype(), DataType::Datetime(_, _) | DataType::Date))
        .unwrap_or(false)
}

fn is_numeric_column(df: &DataFrame, name: &str) -> bool {
    df.column(name)
        .map(|column| {
            matches!(
                column.dtype(),
                DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt8
                    | DataType::UInt16
                    | DataType::UInt32
                    | DataType::UInt64
                    | DataType::Float32
                    | DataType::Float64
            )
        })
        .unwrap_or(false)
}
