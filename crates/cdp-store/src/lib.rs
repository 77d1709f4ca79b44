//! Hand-off stores shared by the pipeline stages: the object store that
//! holds raw JSON batches and the PostgreSQL warehouse that holds the
//! flattened commit table.

pub mod error;
pub mod object;
pub mod warehouse;

pub use error::{Result, StoreError};
pub use object::{FsObjectStore, InMemoryObjectStore, ObjectStore};
pub use warehouse::{
    COMMITS_TABLE, FEATURES_TABLE, WarehouseConfig, load_commits, replace_commits,
    replace_feature_table,
};
