//! CLI argument definitions for the commit data platform.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cdp",
    version,
    about = "Commit Data Platform - batch ETL + ML over GitHub commit metadata",
    long_about = "Batch pipeline over GitHub commit metadata.\n\n\
                  Stages: ingest (API -> object store), transform (object store -> warehouse),\n\
                  validate (data quality gate), train (features + classifier).\n\
                  Each stage runs independently; `run` chains all four."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch commit metadata and stage it in the object store.
    Ingest(IngestArgs),

    /// Flatten the latest staged batch into the warehouse.
    Transform(TransformArgs),

    /// Run the data-quality checks against the warehouse table.
    Validate(ValidateArgs),

    /// Engineer features and train the merge-commit classifier.
    Train,

    /// Run the full pipeline: ingest, transform, validate, train.
    Run,
}

#[derive(Parser)]
pub struct IngestArgs {
    /// Object-store prefix for staged batches.
    #[arg(long = "prefix", default_value = cdp_ingest::DEFAULT_PREFIX)]
    pub prefix: String,
}

#[derive(Parser)]
pub struct TransformArgs {
    /// Object-store prefix to read the latest batch from.
    #[arg(long = "prefix", default_value = cdp_ingest::DEFAULT_PREFIX)]
    pub prefix: String,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Minimum acceptable row count.
    #[arg(long = "min-rows", default_value_t = cdp_validate::DEFAULT_MIN_ROWS)]
    pub min_rows: usize,

    /// Null fraction above which a critical column fails (0.05 = 5%).
    #[arg(long = "null-threshold", default_value_t = cdp_validate::DEFAULT_NULL_THRESHOLD)]
    pub null_threshold: f64,

    /// Primary-key column for duplicate detection.
    #[arg(long = "primary-key", default_value = cdp_model::COMMITS_PRIMARY_KEY)]
    pub primary_key: String,

    /// Report failures without raising a terminal error.
    ///
    /// The exit code still reflects the overall pass/fail verdict.
    #[arg(long = "no-fail-on-error")]
    pub no_fail_on_error: bool,

    /// Write the full JSON report to this path.
    #[arg(long = "report-json", value_name = "PATH")]
    pub report_json: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
