//! Flattening staged commits into the warehouse frame.

use chrono::{DateTime, Datelike, Timelike, Utc};
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};

use cdp_ingest::{GitActor, StagedCommit};
use cdp_store::warehouse::datetime_column;

use crate::error::Result;

/// Flatten a staged batch into the `raw.commits` shape.
///
/// Cleaning mirrors the warehouse contract: date strings are parsed as
/// RFC 3339 with unparseable values coerced to null, text fields are
/// trimmed with missing values becoming empty strings, and
/// `comment_count` defaults to zero.
pub fn commits_to_frame(commits: &[StagedCommit], loaded_at: DateTime<Utc>) -> Result<DataFrame> {
    let rows = commits.len();

    let mut commit_sha = Vec::with_capacity(rows);
    let mut author_name = Vec::with_capacity(rows);
    let mut author_email = Vec::with_capacity(rows);
    let mut author_date = Vec::with_capacity(rows);
    let mut committer_name = Vec::with_capacity(rows);
    let mut committer_email = Vec::with_capacity(rows);
    let mut committer_date = Vec::with_capacity(rows);
    let mut commit_message = Vec::with_capacity(rows);
    let mut comment_count = Vec::with_capacity(rows);
    let mut message_length = Vec::with_capacity(rows);
    let mut is_merge_commit = Vec::with_capacity(rows);
    let mut commit_hour = Vec::with_capacity(rows);
    let mut day_of_week = Vec::with_capacity(rows);
    let mut source_repository = Vec::with_capacity(rows);

    for staged in commits {
        let authored = parse_date(staged.commit.author.as_ref());
        let committed = parse_date(staged.commit.committer.as_ref());
        let message = clean_text(staged.commit.message.as_deref());

        commit_sha.push(staged.sha.clone());
        author_name.push(actor_field(staged.commit.author.as_ref(), |a| {
            a.name.as_deref()
        }));
        author_email.push(actor_field(staged.commit.author.as_ref(), |a| {
            a.email.as_deref()
        }));
        author_date.push(authored.map(|dt| dt.timestamp_micros()));
        committer_name.push(actor_field(staged.commit.committer.as_ref(), |a| {
            a.name.as_deref()
        }));
        committer_email.push(actor_field(staged.commit.committer.as_ref(), |a| {
            a.email.as_deref()
        }));
        committer_date.push(committed.map(|dt| dt.timestamp_micros()));
        message_length.push(message.chars().count() as i64);
        is_merge_commit.push(message.to_lowercase().contains("merge"));
        commit_message.push(message);
        comment_count.push(staged.commit.comment_count);
        commit_hour.push(authored.map(|dt| i64::from(dt.hour())));
        day_of_week.push(authored.map(|dt| i64::from(dt.weekday().num_days_from_monday())));
        source_repository.push(staged.source_repository.clone());
    }

    let loaded_micros = vec![Some(loaded_at.timestamp_micros()); rows];
    let source = vec!["github_api".to_string(); rows];

    let columns = vec![
        Series::new("commit_sha".into(), commit_sha).into_column(),
        Series::new("author_name".into(), author_name).into_column(),
        Series::new("author_email".into(), author_email).into_column(),
        datetime_column("author_date", author_date)?,
        Series::new("committer_name".into(), committer_name).into_column(),
        Series::new("committer_email".into(), committer_email).into_column(),
        datetime_column("committer_date", committer_date)?,
        Series::new("commit_message".into(), commit_message).into_column(),
        Series::new("comment_count".into(), comment_count).into_column(),
        Series::new("message_length".into(), message_length).into_column(),
        Series::new("is_merge_commit".into(), is_merge_commit).into_column(),
        Series::new("commit_hour".into(), commit_hour).into_column(),
        Series::new("day_of_week".into(), day_of_week).into_column(),
        Series::new("source_repository".into(), source_repository).into_column(),
        datetime_column("loaded_at", loaded_micros)?,
        Series::new("source".into(), source).into_column(),
    ];

    let df = DataFrame::new(columns)?;
    tracing::info!(
        rows = df.height(),
        columns = df.width(),
        "transformation complete"
    );
    Ok(df)
}

fn parse_date(actor: Option<&GitActor>) -> Option<DateTime<Utc>> {
    let raw = actor?.date.as_deref()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn actor_field<'a>(
    actor: Option<&'a GitActor>,
    select: impl Fn(&'a GitActor) -> Option<&'a str>,
) -> String {
    clean_text(actor.and_then(select))
}

fn clean_text(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{AnyValue, DataType};

    use cdp_ingest::{CommitDetail, ParentRef};

    fn actor(name: &str, email: &str, date: Option<&str>) -> GitActor {
        GitActor {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            date: date.map(String::from),
        }
    }

    fn staged(sha: &str, message: &str, date: Option<&str>) -> StagedCommit {
        StagedCommit {
            sha: sha.to_string(),
            commit: CommitDetail {
                author: Some(actor("Ada", "ada@example.com", date)),
                committer: Some(actor("Bot", "bot@example.com", date)),
                message: Some(message.to_string()),
                comment_count: 2,
            },
            parents: vec![ParentRef {
                sha: "b".repeat(40),
            }],
            source_repository: "octocat/hello".to_string(),
            ingestion_timestamp: "2024-03-01T12:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn flattens_into_warehouse_columns() {
        let commits = vec![staged(
            &"a".repeat(40),
            "Merge pull request #42",
            // 2024-03-01 is a Friday.
            Some("2024-03-01T14:30:00Z"),
        )];
        let df = commits_to_frame(&commits, Utc::now()).unwrap();

        assert_eq!(df.height(), 1);
        assert!(matches!(
            df.column("author_date").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
        assert_eq!(
            df.column("author_name").unwrap().get(0).unwrap(),
            AnyValue::String("Ada")
        );
        assert_eq!(
            df.column("is_merge_commit").unwrap().get(0).unwrap(),
            AnyValue::Boolean(true)
        );
        assert_eq!(
            df.column("commit_hour").unwrap().get(0).unwrap(),
            AnyValue::Int64(14)
        );
        assert_eq!(
            df.column("day_of_week").unwrap().get(0).unwrap(),
            AnyValue::Int64(4)
        );
        assert_eq!(
            df.column("message_length").unwrap().get(0).unwrap(),
            AnyValue::Int64(22)
        );
        assert_eq!(
            df.column("source").unwrap().get(0).unwrap(),
            AnyValue::String("github_api")
        );
    }

    #[test]
    fn coerces_bad_dates_to_null() {
        let commits = vec![staged(&"a".repeat(40), "fix", Some("not-a-date"))];
        let df = commits_to_frame(&commits, Utc::now()).unwrap();

        assert_eq!(df.column("author_date").unwrap().null_count(), 1);
        assert_eq!(df.column("commit_hour").unwrap().null_count(), 1);
        assert_eq!(df.column("day_of_week").unwrap().null_count(), 1);
    }

    #[test]
    fn missing_actor_becomes_empty_text() {
        let mut commit = staged(&"a".repeat(40), "fix", None);
        commit.commit.author = None;
        commit.commit.message = None;
        let df = commits_to_frame(&[commit], Utc::now()).unwrap();

        assert_eq!(
            df.column("author_name").unwrap().get(0).unwrap(),
            AnyValue::String("")
        );
        assert_eq!(
            df.column("commit_message").unwrap().get(0).unwrap(),
            AnyValue::String("")
        );
        assert_eq!(
            df.column("message_length").unwrap().get(0).unwrap(),
            AnyValue::Int64(0)
        );
        assert_eq!(
            df.column("is_merge_commit").unwrap().get(0).unwrap(),
            AnyValue::Boolean(false)
        );
    }
}
