//! The fixed column contract for the `raw.commits` dataset.

/// Columns every validated commit dataset must carry.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "commit_sha",
    "author_name",
    "author_email",
    "author_date",
    "committer_name",
    "committer_email",
    "committer_date",
    "commit_message",
    "comment_count",
];

/// Columns subject to the null-fraction check (required minus `comment_count`).
pub const CRITICAL_COLUMNS: [&str; 8] = [
    "commit_sha",
    "author_name",
    "author_email",
    "author_date",
    "committer_name",
    "committer_email",
    "committer_date",
    "commit_message",
];

/// Column used to detect duplicate records.
pub const COMMITS_PRIMARY_KEY: &str = "commit_sha";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_columns_are_required_minus_comment_count() {
        let expected: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| *column != "comment_count")
            .collect();
        assert_eq!(CRITICAL_COLUMNS.to_vec(), expected);
    }

    #[test]
    fn primary_key_is_required() {
        assert!(REQUIRED_COLUMNS.contains(&COMMITS_PRIMARY_KEY));
    }
}
