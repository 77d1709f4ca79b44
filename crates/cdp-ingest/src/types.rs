//! GitHub commits API types.

use serde::{Deserialize, Serialize};

/// One commit as returned by `GET /repos/{owner}/{repo}/commits`.
///
/// Only the fields the pipeline consumes are modeled; the rest of the
/// payload is dropped at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommit {
    /// Full 40-character commit SHA.
    pub sha: String,

    /// Nested commit detail (author, committer, message).
    pub commit: CommitDetail,

    /// Parent references; more than one marks a merge commit.
    #[serde(default)]
    pub parents: Vec<ParentRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitDetail {
    pub author: Option<GitActor>,
    pub committer: Option<GitActor>,
    pub message: Option<String>,
    #[serde(default)]
    pub comment_count: i64,
}

/// Author or committer identity on a commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitActor {
    pub name: Option<String>,
    pub email: Option<String>,
    /// RFC 3339 timestamp string as sent by the API.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentRef {
    pub sha: String,
}

/// A raw commit tagged with provenance, as staged in the object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedCommit {
    pub sha: String,
    pub commit: CommitDetail,
    #[serde(default)]
    pub parents: Vec<ParentRef>,
    /// `owner/name` of the repository the commit was fetched from.
    pub source_repository: String,
    /// RFC 3339 timestamp of the ingestion run.
    pub ingestion_timestamp: String,
}

impl StagedCommit {
    pub fn from_raw(raw: RawCommit, repository: &str, ingested_at: &str) -> Self {
        Self {
            sha: raw.sha,
            commit: raw.commit,
            parents: raw.parents,
            source_repository: repository.to_string(),
            ingestion_timestamp: ingested_at.to_string(),
        }
    }

    /// Merge commits have more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}
