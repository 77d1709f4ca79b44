//! Stage command implementations.

use std::path::PathBuf;

use anyhow::Result;
use sqlx::PgPool;

use cdp_ingest::{GitHubCommitsClient, IngestJob};
use cdp_store::{FsObjectStore, WarehouseConfig, load_commits};
use cdp_validate::{ValidateError, ValidationEngine, write_validation_report_json};

use crate::cli::{IngestArgs, TransformArgs, ValidateArgs};
use crate::summary::print_report;

/// Open the filesystem object store under `CDP_DATA_DIR`/`CDP_BUCKET`.
fn open_store() -> Result<FsObjectStore> {
    let data_dir = std::env::var("CDP_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let bucket = std::env::var("CDP_BUCKET").unwrap_or_else(|_| "raw-data".to_string());
    Ok(FsObjectStore::open(PathBuf::from(data_dir).join(bucket))?)
}

async fn connect_warehouse() -> Result<PgPool> {
    Ok(WarehouseConfig::from_env().connect().await?)
}

pub async fn run_ingest(args: &IngestArgs) -> Result<()> {
    let token = std::env::var("GITHUB_TOKEN").ok();
    let client = GitHubCommitsClient::new(token.as_deref())?;
    let store = open_store()?;
    let job = IngestJob::from_env().with_prefix(args.prefix.clone());

    let staged = job.run(&client, &store).await?;
    println!(
        "Staged {} ({} bytes, sha256 {})",
        staged.key, staged.bytes, staged.sha256
    );
    Ok(())
}

pub async fn run_transform(args: &TransformArgs) -> Result<()> {
    let store = open_store()?;
    let pool = connect_warehouse().await?;

    let rows = cdp_transform::run(&store, &pool, &args.prefix).await?;
    println!("Loaded {rows} rows into {}", cdp_store::COMMITS_TABLE);
    Ok(())
}

/// Run the validation battery. Returns the overall pass verdict; with
/// fail-fast (the default) a failure surfaces as a terminal error instead.
pub async fn run_validate(args: &ValidateArgs) -> Result<bool> {
    let pool = connect_warehouse().await?;
    let df = load_commits(&pool).await?;

    let engine = ValidationEngine::new()
        .with_min_rows(args.min_rows)
        .with_null_threshold(args.null_threshold)
        .with_primary_key(args.primary_key.clone());

    let report = engine.execute(&df);
    print_report(&report);

    if let Some(path) = &args.report_json {
        let written = write_validation_report_json(path, &report)?;
        println!("Report written to {}", written.display());
    }

    if !args.no_fail_on_error && !report.passed() {
        return Err(ValidateError::QualityGate {
            failures: report.failed_checks(),
        }
        .into());
    }
    Ok(report.passed())
}

pub async fn run_train() -> Result<()> {
    let pool = connect_warehouse().await?;
    let options = cdp_ml::TrainOptions::from_env();

    match cdp_ml::run(&pool, &options).await? {
        Some(report) => {
            for (name, value) in report.metrics.as_pairs() {
                println!("{name}: {value:.4}");
            }
            if let Some(path) = &report.model_path {
                println!("Model saved to {}", path.display());
            }
            if let Some(run_id) = &report.tracking_run_id {
                println!("Tracking run: {run_id}");
            }
        }
        None => println!("Training skipped (no usable target)"),
    }
    Ok(())
}

/// The whole pipeline with fail-fast validation between transform and
/// train.
pub async fn run_pipeline() -> Result<()> {
    run_ingest(&IngestArgs {
        prefix: cdp_ingest::DEFAULT_PREFIX.to_string(),
    })
    .await?;
    run_transform(&TransformArgs {
        prefix: cdp_ingest::DEFAULT_PREFIX.to_string(),
    })
    .await?;
    run_validate(&ValidateArgs {
        min_rows: cdp_validate::DEFAULT_MIN_ROWS,
        null_threshold: cdp_validate::DEFAULT_NULL_THRESHOLD,
        primary_key: cdp_model::COMMITS_PRIMARY_KEY.to_string(),
        no_fail_on_error: false,
        report_json: None,
    })
    .await?;
    run_train().await
}
