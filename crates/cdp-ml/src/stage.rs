//! ML stage entry point: warehouse -> features -> model -> tracking.

use sqlx::PgPool;

use cdp_store::{load_commits, replace_feature_table};

use crate::error::Result;
use crate::features::engineer_features;
use crate::tracking::MlflowClient;
use crate::train::{TrainOptions, TrainingReport, train};

/// Run the full ML stage. Returns `None` when training was skipped
/// (missing target or single-class data).
///
/// Feature-table persistence and experiment tracking are best-effort:
/// their failures are logged and do not fail the stage.
pub async fn run(pool: &PgPool, options: &TrainOptions) -> Result<Option<TrainingReport>> {
    let df = load_commits(pool).await?;
    let features = engineer_features(&df)?;

    if let Err(error) = replace_feature_table(pool, &features).await {
        tracing::warn!(%error, "failed to save feature table, continuing");
    }

    let Some(mut report) = train(&features, options)? else {
        return Ok(None);
    };

    if let Ok(tracking_uri) = std::env::var("MLFLOW_TRACKING_URI") {
        match MlflowClient::new(&tracking_uri) {
            Ok(client) => match client.log_training_run("commit-analysis", &report).await {
                Ok(run_id) => report.tracking_run_id = Some(run_id),
                Err(error) => tracing::warn!(%error, "experiment tracking failed, continuing"),
            },
            Err(error) => tracing::warn!(%error, "could not create tracking client"),
        }
    }

    Ok(Some(report))
}
