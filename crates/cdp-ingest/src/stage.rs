//! Batch fetching and object-store staging.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use cdp_store::ObjectStore;

use crate::client::GitHubCommitsClient;
use crate::error::{IngestError, Result};
use crate::types::StagedCommit;

/// Object-store prefix raw batches are staged under.
pub const DEFAULT_PREFIX: &str = "github-commits";

/// Repositories sampled by default: active projects with heavy PR/merge
/// traffic, so the staged batches carry both merge and regular commits.
pub const DEFAULT_REPOSITORIES: [&str; 4] = [
    "vercel/next.js",
    "facebook/react",
    "microsoft/vscode",
    "kubernetes/kubernetes",
];

const DEFAULT_PER_PAGE: u32 = 50;

/// Receipt for one staged batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub key: String,
    pub bytes: u64,
    pub sha256: String,
}

/// One ingestion run: fetch from every configured repository, tag with
/// provenance, stage the combined batch.
#[derive(Debug, Clone)]
pub struct IngestJob {
    repositories: Vec<String>,
    per_page: u32,
    prefix: String,
}

impl Default for IngestJob {
    fn default() -> Self {
        Self {
            repositories: DEFAULT_REPOSITORIES
                .iter()
                .map(|repo| (*repo).to_string())
                .collect(),
            per_page: DEFAULT_PER_PAGE,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl IngestJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the repository list, e.g. from `CDP_REPOSITORIES`.
    pub fn with_repositories(mut self, repositories: Vec<String>) -> Self {
        if !repositories.is_empty() {
            self.repositories = repositories;
        }
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Build from the environment: `CDP_REPOSITORIES` is a comma-separated
    /// `owner/name` list overriding the defaults.
    pub fn from_env() -> Self {
        let repositories = std::env::var("CDP_REPOSITORIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|repo| !repo.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Self::new().with_repositories(repositories)
    }

    /// Fetch commits from every configured repository. A repository that
    /// fails is logged and skipped; only a fully empty result is an error.
    pub async fn fetch_all(&self, client: &GitHubCommitsClient) -> Result<Vec<StagedCommit>> {
        let ingested_at = Utc::now().to_rfc3339();
        let mut all_commits = Vec::new();

        for repo in &self.repositories {
            tracing::info!(repo, "fetching commits");
            match client.list_commits(repo, self.per_page).await {
                Ok(commits) => {
                    tracing::info!(repo, count = commits.len(), "fetched commits");
                    all_commits.extend(
                        commits
                            .into_iter()
                            .map(|raw| StagedCommit::from_raw(raw, repo, &ingested_at)),
                    );
                }
                Err(error) => {
                    tracing::warn!(repo, %error, "fetch failed, skipping repository");
                }
            }
        }

        tracing::info!(
            total = all_commits.len(),
            repositories = self.repositories.len(),
            "fetch complete"
        );

        if all_commits.is_empty() {
            return Err(IngestError::NoData);
        }
        Ok(all_commits)
    }

    /// Serialize the batch and put it under a timestamp-keyed path.
    pub fn stage(
        &self,
        store: &dyn ObjectStore,
        commits: &[StagedCommit],
        now: DateTime<Utc>,
    ) -> Result<StagedObject> {
        log_batch_stats(commits);

        let key = object_key(&self.prefix, now);
        let payload = serde_json::to_vec_pretty(commits)?;
        let digest = hex::encode(Sha256::digest(&payload));

        store.put(&key, &payload)?;
        tracing::info!(
            key,
            bytes = payload.len(),
            sha256 = %digest,
            "staged raw batch"
        );

        Ok(StagedObject {
            key,
            bytes: payload.len() as u64,
            sha256: digest,
        })
    }

    /// Full stage run: fetch, tag, stage. Returns the staged object receipt.
    pub async fn run(
        &self,
        client: &GitHubCommitsClient,
        store: &dyn ObjectStore,
    ) -> Result<StagedObject> {
        let commits = self.fetch_all(client).await?;
        self.stage(store, &commits, Utc::now())
    }
}

/// `prefix/YYYY-MM-DD/HH-MM-SS.json` in UTC, so key order is time order.
pub fn object_key(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}.json",
        prefix,
        now.format("%Y-%m-%d"),
        now.format("%H-%M-%S")
    )
}

fn log_batch_stats(commits: &[StagedCommit]) {
    let total = commits.len();
    if total == 0 {
        return;
    }
    let merges = commits.iter().filter(|commit| commit.is_merge()).count();
    let mut per_repo: BTreeMap<&str, usize> = BTreeMap::new();
    for commit in commits {
        *per_repo.entry(commit.source_repository.as_str()).or_default() += 1;
    }
    tracing::info!(
        total,
        merge_commits = merges,
        regular_commits = total - merges,
        merge_pct = format!("{:.1}", merges as f64 / total as f64 * 100.0),
        "batch statistics"
    );
    for (repo, count) in per_repo {
        tracing::info!(repo, count, "repository contribution");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_store::InMemoryObjectStore;
    use chrono::TimeZone;

    use crate::types::{CommitDetail, StagedCommit};

    fn staged(sha: &str, repo: &str) -> StagedCommit {
        StagedCommit {
            sha: sha.to_string(),
            commit: CommitDetail::default(),
            parents: Vec::new(),
            source_repository: repo.to_string(),
            ingestion_timestamp: "2024-03-01T12:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn object_key_is_timestamp_path() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 22).unwrap();
        assert_eq!(
            object_key("github-commits", now),
            "github-commits/2024-03-01/14-05-22.json"
        );
    }

    #[test]
    fn stage_writes_batch_and_digest() {
        let store = InMemoryObjectStore::new();
        let job = IngestJob::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 22).unwrap();
        let commits = vec![staged("a".repeat(40).as_str(), "octocat/hello")];

        let object = job.stage(&store, &commits, now).unwrap();

        assert_eq!(object.key, "github-commits/2024-03-01/14-05-22.json");
        assert_eq!(object.sha256.len(), 64);
        let stored = store.get(&object.key).unwrap();
        assert_eq!(stored.len() as u64, object.bytes);
        let parsed: Vec<StagedCommit> = serde_json::from_slice(&stored).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].source_repository, "octocat/hello");
    }

    #[test]
    fn env_repository_override_is_parsed() {
        let job = IngestJob::new()
            .with_repositories(vec!["a/b".to_string(), "c/d".to_string()]);
        assert_eq!(job.repositories, vec!["a/b", "c/d"]);

        // Empty override keeps the defaults.
        let job = IngestJob::new().with_repositories(Vec::new());
        assert_eq!(job.repositories.len(), DEFAULT_REPOSITORIES.len());
    }
}
