//! Feature engineering for merge-commit prediction.
//!
//! Each feature block only runs when its source column is present, so a
//! reduced table still yields a usable (smaller) feature frame.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Timelike, Utc};
use polars::prelude::{AnyValue, DataFrame, IntoColumn, NamedFrom, Series, TimeUnit};
use regex::Regex;

use crate::error::Result;

/// Candidate model inputs, in training order.
pub const FEATURE_COLUMNS: [&str; 13] = [
    "message_length",
    "message_word_count",
    "has_issue_ref",
    "has_pr_ref",
    "hour_of_day",
    "day_of_week",
    "is_weekend",
    "is_business_hours",
    "is_company_email",
    "has_comments",
    "comment_count",
    "author_commit_count",
    "author_avg_comments",
];

/// Label column: whether the commit message marks a merge.
pub const TARGET_COLUMN: &str = "is_merge";

static ISSUE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\d+").expect("valid issue pattern"));
static PR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(PR|pull request)").expect("valid PR pattern"));

/// Hosting domains treated as organization addresses.
const COMPANY_DOMAINS: [&str; 2] = ["python.org", "github.com"];

/// Derive the ML feature frame from the commit table.
pub fn engineer_features(df: &DataFrame) -> Result<DataFrame> {
    let rows = df.height();
    let mut columns = Vec::new();

    let messages = text_rows(df, "commit_message");
    if let Some(messages) = &messages {
        let lengths: Vec<Option<i64>> = messages
            .iter()
            .map(|m| m.as_ref().map(|m| m.chars().count() as i64))
            .collect();
        let word_counts: Vec<Option<i64>> = messages
            .iter()
            .map(|m| m.as_ref().map(|m| m.split_whitespace().count() as i64))
            .collect();
        let issue_refs: Vec<i64> = messages
            .iter()
            .map(|m| flag(m.as_deref().is_some_and(|m| ISSUE_REF.is_match(m))))
            .collect();
        let pr_refs: Vec<i64> = messages
            .iter()
            .map(|m| flag(m.as_deref().is_some_and(|m| PR_REF.is_match(m))))
            .collect();
        let is_merge: Vec<i64> = messages
            .iter()
            .map(|m| flag(m.as_deref().is_some_and(|m| m.to_lowercase().contains("merge"))))
            .collect();

        columns.push(Series::new("message_length".into(), lengths).into_column());
        columns.push(Series::new("message_word_count".into(), word_counts).into_column());
        columns.push(Series::new("has_issue_ref".into(), issue_refs).into_column());
        columns.push(Series::new("has_pr_ref".into(), pr_refs).into_column());
        columns.push(Series::new(TARGET_COLUMN.into(), is_merge).into_column());
    }

    if let Some(dates) = datetime_rows(df, "author_date") {
        let hours: Vec<Option<i64>> = dates
            .iter()
            .map(|d| d.map(|d| i64::from(d.hour())))
            .collect();
        let days: Vec<Option<i64>> = dates
            .iter()
            .map(|d| d.map(|d| i64::from(d.weekday().num_days_from_monday())))
            .collect();
        let weekends: Vec<i64> = days
            .iter()
            .map(|d| flag(d.is_some_and(|d| d >= 5)))
            .collect();
        let business: Vec<i64> = hours
            .iter()
            .map(|h| flag(h.is_some_and(|h| (9..=17).contains(&h))))
            .collect();

        columns.push(Series::new("hour_of_day".into(), hours).into_column());
        columns.push(Series::new("day_of_week".into(), days).into_column());
        columns.push(Series::new("is_weekend".into(), weekends).into_column());
        columns.push(Series::new("is_business_hours".into(), business).into_column());
    }

    let emails = text_rows(df, "author_email");
    if let Some(emails) = &emails {
        let company: Vec<i64> = emails
            .iter()
            .map(|e| {
                flag(e.as_deref().is_some_and(|e| {
                    email_domain(e)
                        .map(|domain| {
                            COMPANY_DOMAINS
                                .iter()
                                .any(|company| domain.contains(company))
                        })
                        .unwrap_or(false)
                }))
            })
            .collect();
        columns.push(Series::new("is_company_email".into(), company).into_column());
    }

    let comment_counts = int_rows(df, "comment_count");
    if let Some(counts) = &comment_counts {
        let has_comments: Vec<i64> = counts
            .iter()
            .map(|c| flag(c.is_some_and(|c| c > 0)))
            .collect();
        columns.push(Series::new("has_comments".into(), has_comments).into_column());
        columns.push(Series::new("comment_count".into(), counts.clone()).into_column());
    }

    // Per-author aggregates over the whole batch.
    if let Some(emails) = &emails {
        let mut commit_totals: HashMap<&str, i64> = HashMap::new();
        let mut comment_totals: HashMap<&str, (f64, i64)> = HashMap::new();
        for (idx, email) in emails.iter().enumerate() {
            let Some(email) = email.as_deref() else {
                continue;
            };
            *commit_totals.entry(email).or_default() += 1;
            if let Some(counts) = &comment_counts
                && let Some(count) = counts[idx]
            {
                let entry = comment_totals.entry(email).or_default();
                entry.0 += count as f64;
                entry.1 += 1;
            }
        }

        let author_commit_count: Vec<Option<i64>> = emails
            .iter()
            .map(|e| {
                e.as_deref()
                    .map(|email| commit_totals.get(email).copied().unwrap_or(0))
            })
            .collect();
        let author_avg_comments: Vec<Option<f64>> = emails
            .iter()
            .map(|e| {
                e.as_deref().and_then(|email| {
                    comment_totals
                        .get(email)
                        .filter(|(_, n)| *n > 0)
                        .map(|(sum, n)| sum / *n as f64)
                })
            })
            .collect();

        columns.push(Series::new("author_commit_count".into(), author_commit_count).into_column());
        columns.push(Series::new("author_avg_comments".into(), author_avg_comments).into_column());
    }

    let features = DataFrame::new(columns)?;
    tracing::info!(
        rows,
        features = features.width(),
        "feature engineering complete"
    );
    Ok(features)
}

/// Flatten the feature frame into a model matrix over the available
/// feature columns, nulls filled with zero. Returns the matrix, the
/// target vector, and the feature names used.
pub fn to_matrix(features: &DataFrame) -> Result<(Vec<Vec<f64>>, Vec<i32>, Vec<String>)> {
    let available: Vec<String> = FEATURE_COLUMNS
        .iter()
        .filter(|name| features.column(name).is_ok())
        .map(|name| (*name).to_string())
        .collect();

    let mut matrix = Vec::with_capacity(features.height());
    for idx in 0..features.height() {
        let mut row = Vec::with_capacity(available.len());
        for name in &available {
            let column = features.column(name)?;
            row.push(any_to_f64(&column.get(idx).unwrap_or(AnyValue::Null)).unwrap_or(0.0));
        }
        matrix.push(row);
    }

    let mut target = Vec::with_capacity(features.height());
    if let Ok(column) = features.column(TARGET_COLUMN) {
        for idx in 0..features.height() {
            let value = any_to_f64(&column.get(idx).unwrap_or(AnyValue::Null)).unwrap_or(0.0);
            target.push(value as i32);
        }
    }

    Ok((matrix, target, available))
}

fn flag(value: bool) -> i64 {
    i64::from(value)
}

fn email_domain(email: &str) -> Option<&str> {
    email.rsplit_once('@').map(|(_, domain)| domain)
}

fn text_rows(df: &DataFrame, name: &str) -> Option<Vec<Option<String>>> {
    let column = df.column(name).ok()?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(match column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::Null => None,
            AnyValue::String(s) => Some(s.to_string()),
            AnyValue::StringOwned(s) => Some(s.to_string()),
            other => Some(other.to_string()),
        });
    }
    Some(values)
}

fn int_rows(df: &DataFrame, name: &str) -> Option<Vec<Option<i64>>> {
    let column = df.column(name).ok()?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_i64(&column.get(idx).unwrap_or(AnyValue::Null)));
    }
    Some(values)
}

fn datetime_rows(df: &DataFrame, name: &str) -> Option<Vec<Option<DateTime<Utc>>>> {
    let column = df.column(name).ok()?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let micros = match column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::Datetime(v, unit, _) => Some(to_micros(v, unit)),
            AnyValue::DatetimeOwned(v, unit, _) => Some(to_micros(v, unit)),
            _ => None,
        };
        values.push(micros.and_then(DateTime::from_timestamp_micros));
    }
    Some(values)
}

fn to_micros(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value / 1_000,
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value * 1_000,
    }
}

fn any_to_i64(value: &AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Int8(v) => Some(i64::from(*v)),
        AnyValue::Int16(v) => Some(i64::from(*v)),
        AnyValue::Int32(v) => Some(i64::from(*v)),
        AnyValue::Int64(v) => Some(*v),
        AnyValue::UInt8(v) => Some(i64::from(*v)),
        AnyValue::UInt16(v) => Some(i64::from(*v)),
        AnyValue::UInt32(v) => Some(i64::from(*v)),
        AnyValue::UInt64(v) => i64::try_from(*v).ok(),
        AnyValue::Float32(v) => Some(*v as i64),
        AnyValue::Float64(v) => Some(*v as i64),
        AnyValue::Boolean(v) => Some(i64::from(*v)),
        _ => None,
    }
}

fn any_to_f64(value: &AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Int8(v) => Some(f64::from(*v)),
        AnyValue::Int16(v) => Some(f64::from(*v)),
        AnyValue::Int32(v) => Some(f64::from(*v)),
        AnyValue::Int64(v) => Some(*v as f64),
        AnyValue::UInt8(v) => Some(f64::from(*v)),
        AnyValue::UInt16(v) => Some(f64::from(*v)),
        AnyValue::UInt32(v) => Some(f64::from(*v)),
        AnyValue::UInt64(v) => Some(*v as f64),
        AnyValue::Float32(v) => Some(f64::from(*v)),
        AnyValue::Float64(v) => Some(*v),
        AnyValue::Boolean(v) => Some(f64::from(u8::from(*v))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{DataType, IntoColumn};

    fn commit_df() -> DataFrame {
        let messages = vec![
            "Merge pull request #12 from main".to_string(),
            "fix typo".to_string(),
            "add feature #7".to_string(),
        ];
        let emails = vec![
            "ada@python.org".to_string(),
            "ada@python.org".to_string(),
            "bob@example.com".to_string(),
        ];
        // Friday 2024-03-01 14:30 UTC, Saturday 02:00, Monday 10:00.
        let micros = vec![
            Some(1_709_303_400_000_000i64),
            Some(1_709_344_800_000_000i64),
            Some(1_709_546_400_000_000i64),
        ];
        DataFrame::new(vec![
            Series::new("commit_message".into(), messages).into_column(),
            Series::new("author_email".into(), emails).into_column(),
            Series::new("author_date".into(), micros)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
                .unwrap()
                .into_column(),
            Series::new("comment_count".into(), vec![3i64, 0, 1]).into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn derives_message_features_and_target() {
        let features = engineer_features(&commit_df()).unwrap();

        let target = features.column(TARGET_COLUMN).unwrap();
        assert_eq!(target.get(0).unwrap(), AnyValue::Int64(1));
        assert_eq!(target.get(1).unwrap(), AnyValue::Int64(0));

        let issue_refs = features.column("has_issue_ref").unwrap();
        assert_eq!(issue_refs.get(0).unwrap(), AnyValue::Int64(1));
        assert_eq!(issue_refs.get(1).unwrap(), AnyValue::Int64(0));
        assert_eq!(issue_refs.get(2).unwrap(), AnyValue::Int64(1));

        let pr_refs = features.column("has_pr_ref").unwrap();
        assert_eq!(pr_refs.get(0).unwrap(), AnyValue::Int64(1));
        assert_eq!(pr_refs.get(1).unwrap(), AnyValue::Int64(0));
    }

    #[test]
    fn derives_temporal_and_email_features() {
        let features = engineer_features(&commit_df()).unwrap();

        assert_eq!(
            features.column("hour_of_day").unwrap().get(0).unwrap(),
            AnyValue::Int64(14)
        );
        // 2024-03-02 is a Saturday.
        assert_eq!(
            features.column("is_weekend").unwrap().get(1).unwrap(),
            AnyValue::Int64(1)
        );
        assert_eq!(
            features.column("is_business_hours").unwrap().get(0).unwrap(),
            AnyValue::Int64(1)
        );
        assert_eq!(
            features.column("is_company_email").unwrap().get(0).unwrap(),
            AnyValue::Int64(1)
        );
        assert_eq!(
            features.column("is_company_email").unwrap().get(2).unwrap(),
            AnyValue::Int64(0)
        );
    }

    #[test]
    fn derives_author_aggregates() {
        let features = engineer_features(&commit_df()).unwrap();

        let counts = features.column("author_commit_count").unwrap();
        assert_eq!(counts.get(0).unwrap(), AnyValue::Int64(2));
        assert_eq!(counts.get(2).unwrap(), AnyValue::Int64(1));

        let averages = features.column("author_avg_comments").unwrap();
        assert_eq!(averages.get(0).unwrap(), AnyValue::Float64(1.5));
    }

    #[test]
    fn tolerates_missing_source_columns() {
        let df = DataFrame::new(vec![
            Series::new("commit_message".into(), vec!["merge branch".to_string()]).into_column(),
        ])
        .unwrap();
        let features = engineer_features(&df).unwrap();
        assert!(features.column("hour_of_day").is_err());
        assert!(features.column(TARGET_COLUMN).is_ok());

        let (matrix, target, names) = to_matrix(&features).unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(target, vec![1]);
        assert_eq!(matrix[0].len(), names.len());
        assert!(names.iter().all(|name| FEATURE_COLUMNS.contains(&name.as_str())));
    }
}
