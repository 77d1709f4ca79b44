//! The fixed battery of data-quality checks.
//!
//! Each check is independent and non-throwing: it always returns a
//! structured [`CheckResult`](cdp_model::CheckResult), tolerating absent
//! columns where a prior check is responsible for flagging them.

mod duplicates;
mod nulls;
mod row_count;
mod schema;

pub use duplicates::duplicate_detection;
pub use nulls::null_validation;
pub use row_count::row_count_validation;
pub use schema::schema_validation;

use polars::prelude::{AnyValue, Column};

/// Row value as an owned string; `None` for null.
pub(crate) fn string_value(column: &Column, idx: usize) -> Option<String> {
    match column.get(idx).unwrap_or(AnyValue::Null) {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        other => Some(other.to_string()),
    }
}
