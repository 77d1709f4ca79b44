//! Property tests for check invariants.

use std::collections::HashSet;

use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series, TimeUnit};
use proptest::prelude::{ProptestConfig, proptest};

use cdp_model::{CheckDetails, CheckName, CheckStatus};
use cdp_validate::checks::{duplicate_detection, schema_validation};

fn datetime_col(name: &str, rows: usize) -> Column {
    let micros: Vec<Option<i64>> = (0..rows).map(|idx| Some(idx as i64 * 1_000_000)).collect();
    Series::new(name.into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
        .unwrap()
        .into_column()
}

fn commit_df(shas: Vec<String>) -> DataFrame {
    let rows = shas.len();
    DataFrame::new(vec![
        Series::new("commit_sha".into(), shas).into_column(),
        Series::new("author_name".into(), vec!["Ada".to_string(); rows]).into_column(),
        Series::new("author_email".into(), vec!["a@b.c".to_string(); rows]).into_column(),
        datetime_col("author_date", rows),
        Series::new("committer_name".into(), vec!["Bot".to_string(); rows]).into_column(),
        Series::new("committer_email".into(), vec!["b@b.c".to_string(); rows]).into_column(),
        datetime_col("committer_date", rows),
        Series::new("commit_message".into(), vec!["msg".to_string(); rows]).into_column(),
        Series::new("comment_count".into(), vec![0i64; rows]).into_column(),
    ])
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any dataset of well-formed SHAs with typed columns passes schema
    /// validation.
    #[test]
    fn well_formed_shas_pass_schema(shas in proptest::collection::vec("[a-f0-9]{40}", 1..40)) {
        let df = commit_df(shas);
        let result = schema_validation(&df);
        assert_eq!(result.status, CheckStatus::Passed);
        assert_eq!(result.check, CheckName::SchemaValidation);
    }

    /// The duplicate count always equals rows minus distinct key values.
    #[test]
    fn duplicate_count_matches_distinct_difference(
        shas in proptest::collection::vec("[a-d]{2}", 1..60),
    ) {
        let distinct = shas.iter().collect::<HashSet<_>>().len() as u64;
        let rows = shas.len() as u64;
        let df = commit_df(shas);

        let result = duplicate_detection(&df, "commit_sha");
        let count = match result.details {
            CheckDetails::Duplicates { duplicate_count, .. } => duplicate_count,
            CheckDetails::NoDuplicates { duplicate_count, .. } => duplicate_count,
            other => panic!("unexpected details: {other:?}"),
        };
        assert_eq!(count, rows - distinct);
        if count == 0 {
            assert_eq!(result.status, CheckStatus::Passed);
        } else {
            assert_eq!(result.status, CheckStatus::Warning);
        }
    }
}
