//! Ingestion stage: fetch commit metadata from the GitHub API, tag it
//! with provenance, and stage the batch as a JSON object keyed by
//! timestamp path.

pub mod client;
pub mod error;
pub mod stage;
pub mod types;

pub use client::GitHubCommitsClient;
pub use error::{IngestError, Result};
pub use stage::{DEFAULT_PREFIX, IngestJob, StagedObject, object_key};
pub use types::{CommitDetail, GitActor, ParentRef, RawCommit, StagedCommit};
