//! Transformation stage: read the latest staged batch, flatten it into
//! the commit table shape, and truncate-reload the warehouse.

pub mod error;
pub mod frame;
pub mod stage;

pub use error::{Result, TransformError};
pub use frame::commits_to_frame;
pub use stage::run;
