//! PostgreSQL warehouse access.
//!
//! The transformation stage truncate-reloads `raw.commits`; the validation
//! and ML stages read it back as a full table. The ML stage additionally
//! writes its feature table to `analytics.ml_features`.

use chrono::NaiveDateTime;
use polars::prelude::{
    AnyValue, Column, DataFrame, DataType, IntoColumn, NamedFrom, Series, TimeUnit,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::error::{Result, StoreError};

pub const COMMITS_TABLE: &str = "raw.commits";
pub const FEATURES_TABLE: &str = "analytics.ml_features";

/// Columns of `raw.commits`, in insert order.
const COMMIT_COLUMNS: [&str; 16] = [
    "commit_sha",
    "author_name",
    "author_email",
    "author_date",
    "committer_name",
    "committer_email",
    "committer_date",
    "commit_message",
    "comment_count",
    "message_length",
    "is_merge_commit",
    "commit_hour",
    "day_of_week",
    "source_repository",
    "loaded_at",
    "source",
];

const CREATE_COMMITS_TABLE: &str = "CREATE TABLE IF NOT EXISTS raw.commits (
    commit_sha TEXT,
    author_name TEXT,
    author_email TEXT,
    author_date TIMESTAMP,
    committer_name TEXT,
    committer_email TEXT,
    committer_date TIMESTAMP,
    commit_message TEXT,
    comment_count BIGINT,
    message_length BIGINT,
    is_merge_commit BOOLEAN,
    commit_hour BIGINT,
    day_of_week BIGINT,
    source_repository TEXT,
    loaded_at TIMESTAMP,
    source TEXT
)";

const INSERT_COMMIT: &str = "INSERT INTO raw.commits (
    commit_sha, author_name, author_email, author_date,
    committer_name, committer_email, committer_date,
    commit_message, comment_count, message_length, is_merge_commit,
    commit_hour, day_of_week, source_repository, loaded_at, source
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)";

/// Connection settings, resolved from the environment.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl WarehouseConfig {
    /// Build from `DATABASE_URL`, falling back to the `POSTGRES_*`
    /// variables with the platform defaults.
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            let user = env_or("POSTGRES_USER", "dataplatform");
            let password = env_or("POSTGRES_PASSWORD", "changeme123");
            let host = env_or("POSTGRES_HOST", "postgres");
            let port = env_or("POSTGRES_PORT", "5432");
            let db = env_or("POSTGRES_DB", "analytics");
            format!("postgresql://{user}:{password}@{host}:{port}/{db}")
        });
        Self {
            url,
            max_connections: 5,
        }
    }

    pub async fn connect(&self) -> Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await?;
        Ok(pool)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Truncate-and-reload `raw.commits` from a transformed frame.
///
/// Returns the number of rows written after post-load verification.
pub async fn replace_commits(pool: &PgPool, df: &DataFrame) -> Result<u64> {
    for column in COMMIT_COLUMNS {
        if df.column(column).is_err() {
            return Err(StoreError::InvalidFrame(format!(
                "missing column {column}"
            )));
        }
    }

    let rows = commit_rows(df)?;

    let mut tx = pool.begin().await?;
    sqlx::query("CREATE SCHEMA IF NOT EXISTS raw")
        .execute(&mut *tx)
        .await?;
    sqlx::query(CREATE_COMMITS_TABLE).execute(&mut *tx).await?;
    sqlx::query("TRUNCATE TABLE raw.commits")
        .execute(&mut *tx)
        .await?;

    for (index, row) in rows.iter().enumerate() {
        let mut query = sqlx::query(INSERT_COMMIT);
        query = query
            .bind(&row.commit_sha)
            .bind(&row.author_name)
            .bind(&row.author_email)
            .bind(row.author_date)
            .bind(&row.committer_name)
            .bind(&row.committer_email)
            .bind(row.committer_date)
            .bind(&row.commit_message)
            .bind(row.comment_count)
            .bind(row.message_length)
            .bind(row.is_merge_commit)
            .bind(row.commit_hour)
            .bind(row.day_of_week)
            .bind(&row.source_repository)
            .bind(row.loaded_at)
            .bind(&row.source);
        query.execute(&mut *tx).await?;
        if (index + 1) % 1000 == 0 {
            tracing::debug!(rows = index + 1, "load in progress");
        }
    }
    tx.commit().await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw.commits")
        .fetch_one(pool)
        .await?;
    tracing::info!(rows = count, table = COMMITS_TABLE, "load verified");
    Ok(count as u64)
}

/// Full-table read of `raw.commits` into a frame with warehouse dtypes.
pub async fn load_commits(pool: &PgPool) -> Result<DataFrame> {
    let rows = sqlx::query(
        "SELECT commit_sha, author_name, author_email, author_date,
                committer_name, committer_email, committer_date,
                commit_message, comment_count, message_length, is_merge_commit,
                commit_hour, day_of_week, source_repository, loaded_at, source
         FROM raw.commits",
    )
    .fetch_all(pool)
    .await?;

    let mut commit_sha = Vec::with_capacity(rows.len());
    let mut author_name = Vec::with_capacity(rows.len());
    let mut author_email = Vec::with_capacity(rows.len());
    let mut author_date = Vec::with_capacity(rows.len());
    let mut committer_name = Vec::with_capacity(rows.len());
    let mut committer_email = Vec::with_capacity(rows.len());
    let mut committer_date = Vec::with_capacity(rows.len());
    let mut commit_message = Vec::with_capacity(rows.len());
    let mut comment_count = Vec::with_capacity(rows.len());
    let mut message_length = Vec::with_capacity(rows.len());
    let mut is_merge_commit = Vec::with_capacity(rows.len());
    let mut commit_hour = Vec::with_capacity(rows.len());
    let mut day_of_week = Vec::with_capacity(rows.len());
    let mut source_repository = Vec::with_capacity(rows.len());
    let mut loaded_at = Vec::with_capacity(rows.len());
    let mut source = Vec::with_capacity(rows.len());

    for row in &rows {
        commit_sha.push(row.try_get::<Option<String>, _>("commit_sha")?);
        author_name.push(row.try_get::<Option<String>, _>("author_name")?);
        author_email.push(row.try_get::<Option<String>, _>("author_email")?);
        author_date.push(to_micros(row.try_get::<Option<NaiveDateTime>, _>("author_date")?));
        committer_name.push(row.try_get::<Option<String>, _>("committer_name")?);
        committer_email.push(row.try_get::<Option<String>, _>("committer_email")?);
        committer_date.push(to_micros(
            row.try_get::<Option<NaiveDateTime>, _>("committer_date")?,
        ));
        commit_message.push(row.try_get::<Option<String>, _>("commit_message")?);
        comment_count.push(row.try_get::<Option<i64>, _>("comment_count")?);
        message_length.push(row.try_get::<Option<i64>, _>("message_length")?);
        is_merge_commit.push(row.try_get::<Option<bool>, _>("is_merge_commit")?);
        commit_hour.push(row.try_get::<Option<i64>, _>("commit_hour")?);
        day_of_week.push(row.try_get::<Option<i64>, _>("day_of_week")?);
        source_repository.push(row.try_get::<Option<String>, _>("source_repository")?);
        loaded_at.push(to_micros(row.try_get::<Option<NaiveDateTime>, _>("loaded_at")?));
        source.push(row.try_get::<Option<String>, _>("source")?);
    }

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
        datetime_column("loaded_at", loaded_at)?,
        Series::new("source".into(), source).into_column(),
    ];
    let df = DataFrame::new(columns)?;
    tracing::info!(rows = df.height(), table = COMMITS_TABLE, "loaded commits");
    Ok(df)
}

/// Replace `analytics.ml_features` with the given frame. Column types are
/// mapped from the frame's dtypes.
pub async fn replace_feature_table(pool: &PgPool, df: &DataFrame) -> Result<()> {
    let mut ddl_columns = Vec::new();
    for column in df.get_columns() {
        let sql_type = match column.dtype() {
            DataType::Boolean => "BOOLEAN",
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => "BIGINT",
            DataType::Float32 | DataType::Float64 => "DOUBLE PRECISION",
            DataType::Datetime(_, _) => "TIMESTAMP",
            _ => "TEXT",
        };
        ddl_columns.push(format!("{} {}", column.name(), sql_type));
    }
    let create = format!(
        "CREATE TABLE {} ({})",
        FEATURES_TABLE,
        ddl_columns.join(", ")
    );
    let placeholders: Vec<String> = (1..=df.width()).map(|i| format!("${i}")).collect();
    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        FEATURES_TABLE,
        column_names.join(", "),
        placeholders.join(", ")
    );

    let mut tx = pool.begin().await?;
    sqlx::query("CREATE SCHEMA IF NOT EXISTS analytics")
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("DROP TABLE IF EXISTS {FEATURES_TABLE}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&create).execute(&mut *tx).await?;

    for idx in 0..df.height() {
        let mut query = sqlx::query(&insert);
        for column in df.get_columns() {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            query = match column.dtype() {
                DataType::Boolean => query.bind(any_to_bool(&value)),
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64 => query.bind(any_to_i64(&value)),
                DataType::Float32 | DataType::Float64 => query.bind(any_to_f64(&value)),
                DataType::Datetime(_, _) => query.bind(any_to_naive_datetime(&value)),
                _ => query.bind(any_to_text(&value)),
            };
        }
        query.execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(
        rows = df.height(),
        table = FEATURES_TABLE,
        "feature table replaced"
    );
    Ok(())
}

struct CommitRow {
    commit_sha: Option<String>,
    author_name: Option<String>,
    author_email: Option<String>,
    author_date: Option<NaiveDateTime>,
    committer_name: Option<String>,
    committer_email: Option<String>,
    committer_date: Option<NaiveDateTime>,
    commit_message: Option<String>,
    comment_count: Option<i64>,
    message_length: Option<i64>,
    is_merge_commit: Option<bool>,
    commit_hour: Option<i64>,
    day_of_week: Option<i64>,
    source_repository: Option<String>,
    loaded_at: Option<NaiveDateTime>,
    source: Option<String>,
}

fn commit_rows(df: &DataFrame) -> Result<Vec<CommitRow>> {
    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        rows.push(CommitRow {
            commit_sha: text_at(df, "commit_sha", idx)?,
            author_name: text_at(df, "author_name", idx)?,
            author_email: text_at(df, "author_email", idx)?,
            author_date: datetime_at(df, "author_date", idx)?,
            committer_name: text_at(df, "committer_name", idx)?,
            committer_email: text_at(df, "committer_email", idx)?,
            committer_date: datetime_at(df, "committer_date", idx)?,
            commit_message: text_at(df, "commit_message", idx)?,
            comment_count: int_at(df, "comment_count", idx)?,
            message_length: int_at(df, "message_length", idx)?,
            is_merge_commit: bool_at(df, "is_merge_commit", idx)?,
            commit_hour: int_at(df, "commit_hour", idx)?,
            day_of_week: int_at(df, "day_of_week", idx)?,
            source_repository: text_at(df, "source_repository", idx)?,
            loaded_at: datetime_at(df, "loaded_at", idx)?,
            source: text_at(df, "source", idx)?,
        });
    }
    Ok(rows)
}

fn value_at<'a>(df: &'a DataFrame, name: &str, idx: usize) -> Result<AnyValue<'a>> {
    let column = df.column(name)?;
    Ok(column.get(idx).unwrap_or(AnyValue::Null))
}

fn text_at(df: &DataFrame, name: &str, idx: usize) -> Result<Option<String>> {
    Ok(any_to_text(&value_at(df, name, idx)?))
}

fn int_at(df: &DataFrame, name: &str, idx: usize) -> Result<Option<i64>> {
    Ok(any_to_i64(&value_at(df, name, idx)?))
}

fn bool_at(df: &DataFrame, name: &str, idx: usize) -> Result<Option<bool>> {
    Ok(any_to_bool(&value_at(df, name, idx)?))
}

fn datetime_at(df: &DataFrame, name: &str, idx: usize) -> Result<Option<NaiveDateTime>> {
    Ok(any_to_naive_datetime(&value_at(df, name, idx)?))
}

fn any_to_text(value: &AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some((*s).to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        other => Some(other.to_string()),
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
        _ => None,
    }
}

fn any_to_bool(value: &AnyValue<'_>) -> Option<bool> {
    match value {
        AnyValue::Boolean(v) => Some(*v),
        _ => None,
    }
}

fn any_to_naive_datetime(value: &AnyValue<'_>) -> Option<NaiveDateTime> {
    let micros = match value {
        AnyValue::Datetime(v, unit, _) => Some(unit_to_micros(*v, *unit)),
        AnyValue::DatetimeOwned(v, unit, _) => Some(unit_to_micros(*v, *unit)),
        _ => None,
    }?;
    chrono::DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

fn unit_to_micros(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value / 1_000,
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value * 1_000,
    }
}

fn to_micros(value: Option<NaiveDateTime>) -> Option<i64> {
    value.map(|dt| dt.and_utc().timestamp_micros())
}

/// Build a Datetime(microseconds) column from epoch-micro values.
pub fn datetime_column(name: &str, micros: Vec<Option<i64>>) -> Result<Column> {
    let series = Series::new(name.into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    Ok(series.into_column())
}
