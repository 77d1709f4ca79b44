//! Stage entry point: latest staged batch -> warehouse.

use chrono::Utc;
use sqlx::PgPool;

use cdp_ingest::StagedCommit;
use cdp_store::{ObjectStore, replace_commits};

use crate::error::{Result, TransformError};
use crate::frame::commits_to_frame;

/// Read the most recent staged batch under `prefix`, flatten it, and
/// truncate-reload `raw.commits`. Returns the loaded row count.
pub async fn run(store: &dyn ObjectStore, pool: &PgPool, prefix: &str) -> Result<u64> {
    let key = store
        .latest(prefix)?
        .ok_or_else(|| TransformError::NoRawData(prefix.to_string()))?;
    tracing::info!(key, "reading latest staged batch");

    let bytes = store.get(&key)?;
    let commits: Vec<StagedCommit> = serde_json::from_slice(&bytes)?;
    tracing::info!(records = commits.len(), "parsed staged batch");

    let df = commits_to_frame(&commits, Utc::now())?;
    let rows = replace_commits(pool, &df).await?;
    Ok(rows)
}
