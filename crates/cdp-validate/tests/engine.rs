//! Integration tests for the validation engine.

use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series, TimeUnit};

use cdp_model::{CheckDetails, CheckName, CheckStatus, REQUIRED_COLUMNS};
use cdp_validate::{ValidateError, ValidationEngine, summary_line, write_validation_report_json};

fn text_col(name: &str, values: Vec<&str>) -> Column {
    Series::new(
        name.into(),
        values.iter().copied().map(String::from).collect::<Vec<_>>(),
    )
    .into_column()
}

fn nullable_text_col(name: &str, values: Vec<Option<&str>>) -> Column {
    Series::new(
        name.into(),
        values
            .iter()
            .map(|value| value.map(String::from))
            .collect::<Vec<_>>(),
    )
    .into_column()
}

fn datetime_col(name: &str, rows: usize) -> Column {
    let micros: Vec<Option<i64>> = (0..rows)
        .map(|idx| Some(1_700_000_000_000_000 + idx as i64 * 1_000_000))
        .collect();
    Series::new(name.into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
        .unwrap()
        .into_column()
}

fn int_col(name: &str, rows: usize) -> Column {
    Series::new(name.into(), (0..rows as i64).collect::<Vec<_>>()).into_column()
}

/// Distinct well-formed 40-hex SHA values.
fn sha(seed: usize) -> String {
    format!("{seed:040x}")
}

/// A dataset satisfying every check: unique valid SHAs, typed dates,
/// numeric comment counts, no nulls.
fn valid_df(rows: usize) -> DataFrame {
    let shas: Vec<String> = (0..rows).map(sha).collect();
    DataFrame::new(vec![
        Series::new("commit_sha".into(), shas).into_column(),
        text_col("author_name", vec!["Ada"; rows]),
        text_col("author_email", vec!["ada@example.com"; rows]),
        datetime_col("author_date", rows),
        text_col("committer_name", vec!["Bot"; rows]),
        text_col("committer_email", vec!["bot@example.com"; rows]),
        datetime_col("committer_date", rows),
        text_col("commit_message", vec!["fix things"; rows]),
        int_col("comment_count", rows),
    ])
    .unwrap()
}

#[test]
fn missing_columns_fail_schema_with_exact_set() {
    let df = DataFrame::new(vec![
        text_col("commit_sha", vec![&sha(1)]),
        text_col("author_name", vec!["Ada"]),
    ])
    .unwrap();

    let report = ValidationEngine::new().execute(&df);
    let schema = &report.results.failed[0];
    assert_eq!(schema.check, CheckName::SchemaValidation);
    assert_eq!(schema.status, CheckStatus::Failed);

    let CheckDetails::MissingColumns { missing, .. } = &schema.details else {
        panic!("expected missing-columns details, got {:?}", schema.details);
    };
    let expected: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !matches!(**column, "commit_sha" | "author_name"))
        .map(|column| (*column).to_string())
        .collect();
    assert_eq!(*missing, expected);
}

#[test]
fn well_typed_dataset_passes_schema() {
    let report = ValidationEngine::new().execute(&valid_df(12));
    assert!(
        report
            .results
            .passed
            .iter()
            .any(|result| result.check == CheckName::SchemaValidation)
    );
    assert!(report.passed());
    assert_eq!(report.summary.success_rate, 100.0);
}

#[test]
fn invalid_shas_fail_schema_via_type_errors() {
    let mut df = valid_df(12);
    df.with_column(Series::new(
        "commit_sha".into(),
        (0..12).map(|_| "XYZ".to_string()).collect::<Vec<_>>(),
    ))
    .unwrap();

    let report = ValidationEngine::new().execute(&df);
    let schema = report
        .results
        .failed
        .iter()
        .find(|result| result.check == CheckName::SchemaValidation)
        .expect("schema check should fail");
    let CheckDetails::TypeErrors { type_errors } = &schema.details else {
        panic!("expected type-errors details");
    };
    assert_eq!(type_errors.len(), 1);
    assert!(type_errors[0].contains("12 invalid SHA hashes"));
}

#[test]
fn string_dates_fail_schema_type_check() {
    let rows = 12;
    let mut df = valid_df(rows);
    df.with_column(Series::new(
        "author_date".into(),
        vec!["2024-03-01T10:00:00Z".to_string(); rows],
    ))
    .unwrap();

    let report = ValidationEngine::new().execute(&df);
    let schema = &report.results.failed[0];
    let CheckDetails::TypeErrors { type_errors } = &schema.details else {
        panic!("expected type-errors details");
    };
    assert!(
        type_errors
            .iter()
            .any(|error| error == "author_date is not datetime type")
    );
}

#[test]
fn null_threshold_breach_fails_with_exact_count() {
    let rows = 20;
    let mut df = valid_df(rows);
    // 2 of 20 null = 10% > 5% threshold.
    let emails: Vec<Option<&str>> = (0..rows)
        .map(|idx| if idx < 2 { None } else { Some("ada@example.com") })
        .collect();
    df.with_column(nullable_text_col("author_email", emails))
        .unwrap();

    let report = ValidationEngine::new().execute(&df);
    let nulls = report
        .results
        .failed
        .iter()
        .find(|result| result.check == CheckName::NullValidation)
        .expect("null check should fail");
    let CheckDetails::NullCounts(counts) = &nulls.details else {
        panic!("expected null-count details");
    };
    let email_stats = &counts["author_email"];
    assert_eq!(email_stats.null_count, 2);
    assert_eq!(email_stats.null_percentage, 10.0);
    assert_eq!(email_stats.total_rows, rows);
}

#[test]
fn zero_nulls_pass_null_validation() {
    let report = ValidationEngine::new().execute(&valid_df(15));
    let nulls = report
        .results
        .passed
        .iter()
        .find(|result| result.check == CheckName::NullValidation)
        .expect("null check should pass");
    let CheckDetails::NullCounts(counts) = &nulls.details else {
        panic!("expected null-count details");
    };
    assert_eq!(counts.len(), 8);
    assert!(counts.values().all(|stats| stats.null_count == 0));
}

#[test]
fn unique_primary_keys_pass_duplicate_detection() {
    let report = ValidationEngine::new().execute(&valid_df(12));
    let duplicates = report
        .results
        .passed
        .iter()
        .find(|result| result.check == CheckName::DuplicateDetection)
        .expect("duplicate check should pass");
    let CheckDetails::NoDuplicates {
        duplicate_count, ..
    } = &duplicates.details
    else {
        panic!("expected no-duplicates details");
    };
    assert_eq!(*duplicate_count, 0);
}

#[test]
fn repeated_primary_key_warns_with_repeat_count() {
    let rows = 12;
    let mut df = valid_df(rows);
    // Three rows share one SHA; repeats beyond the first count as 2.
    let shared = sha(999);
    let shas: Vec<String> = (0..rows)
        .map(|idx| if idx < 3 { shared.clone() } else { sha(idx) })
        .collect();
    df.with_column(Series::new("commit_sha".into(), shas))
        .unwrap();

    let report = ValidationEngine::new().execute(&df);
    assert_eq!(report.results.warnings.len(), 1);
    let duplicates = &report.results.warnings[0];
    assert_eq!(duplicates.check, CheckName::DuplicateDetection);
    assert_eq!(duplicates.status, CheckStatus::Warning);
    assert!(duplicates.is_gate_pass());

    let CheckDetails::Duplicates {
        duplicate_count,
        sample_duplicates,
        total_rows,
        ..
    } = &duplicates.details
    else {
        panic!("expected duplicates details");
    };
    assert_eq!(*duplicate_count, 2);
    assert_eq!(*total_rows, rows);
    assert_eq!(sample_duplicates, &vec![shared]);

    // Warnings do not gate the run.
    assert!(report.passed());
    assert!(ValidationEngine::new().run(&df, true).is_ok());
}

#[test]
fn short_dataset_fails_row_count() {
    let report = ValidationEngine::new().execute(&valid_df(5));
    let row_count = report
        .results
        .failed
        .iter()
        .find(|result| result.check == CheckName::RowCountValidation)
        .expect("row count should fail");
    let CheckDetails::RowCount {
        actual_rows,
        minimum_required,
    } = &row_count.details
    else {
        panic!("expected row-count details");
    };
    assert_eq!(*actual_rows, 5);
    assert_eq!(*minimum_required, 10);
}

#[test]
fn schema_failure_gates_fail_fast_run() {
    let mut df = valid_df(12);
    df.with_column(Series::new(
        "commit_sha".into(),
        (0..12).map(|idx| format!("bad-{idx}")).collect::<Vec<_>>(),
    ))
    .unwrap();

    // fail_on_error = true: terminal error listing exactly the one failure.
    let error = ValidationEngine::new().run(&df, true).unwrap_err();
    let ValidateError::QualityGate { failures } = error else {
        panic!("expected quality gate error");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].check, CheckName::SchemaValidation);

    // fail_on_error = false: report returned, overall passed = false.
    let report = ValidationEngine::new().run(&df, false).unwrap();
    assert!(!report.passed());
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.passed, 3);
    assert_eq!(report.summary.warnings, 0);
    assert_eq!(report.summary.success_rate, 75.0);
    insta::assert_snapshot!(
        summary_line(&report),
        @"checks=4 passed=3 failed=1 warnings=0 success_rate=75.00%"
    );
}

#[test]
fn fresh_engines_produce_identical_reports_except_timestamp() {
    let df = valid_df(11);

    let first = ValidationEngine::new().execute(&df);
    let second = ValidationEngine::new().execute(&df);

    let mut first_json = serde_json::to_value(&first).unwrap();
    let mut second_json = serde_json::to_value(&second).unwrap();
    first_json.as_object_mut().unwrap().remove("timestamp");
    second_json.as_object_mut().unwrap().remove("timestamp");
    assert_eq!(first_json, second_json);
}

#[test]
fn report_json_is_written_with_schema_header() {
    let df = valid_df(11);
    let report = ValidationEngine::new().execute(&df);

    let dir = std::env::temp_dir().join("cdp-validate-report-test");
    let path = dir.join("validation_report.json");
    write_validation_report_json(&path, &report).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["schema"], "commit-data-platform.validation-report");
    assert_eq!(value["summary"]["total_checks"], 4);
    assert_eq!(value["summary"]["success_rate"], 100.0);
    std::fs::remove_dir_all(&dir).ok();
}
