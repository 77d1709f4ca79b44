//! Random-forest training for merge-commit prediction.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use polars::prelude::DataFrame;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{MlError, Result};
use crate::features::to_matrix;
use crate::metrics::{accuracy, f1_weighted, precision_weighted, recall_weighted};
use crate::scale::StandardScaler;

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub n_trees: u16,
    pub max_depth: u16,
    pub seed: u64,
    pub test_fraction: f64,
    pub model_dir: PathBuf,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            seed: 42,
            test_fraction: 0.2,
            model_dir: PathBuf::from("models"),
        }
    }
}

impl TrainOptions {
    /// Defaults with `CDP_MODEL_DIR` overriding the artifact directory.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(dir) = std::env::var("CDP_MODEL_DIR") {
            options.model_dir = PathBuf::from(dir);
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingMetrics {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub test_precision: f64,
    pub test_recall: f64,
    pub test_f1: f64,
}

impl TrainingMetrics {
    pub fn as_pairs(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("train_accuracy", self.train_accuracy),
            ("test_accuracy", self.test_accuracy),
            ("test_precision", self.test_precision),
            ("test_recall", self.test_recall),
            ("test_f1", self.test_f1),
        ]
    }
}

/// Outcome of a completed training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub metrics: TrainingMetrics,
    pub features: Vec<String>,
    pub train_size: usize,
    pub test_size: usize,
    pub model_path: Option<PathBuf>,
    pub tracking_run_id: Option<String>,
}

/// Train the classifier on the engineered feature frame.
///
/// Returns `None` (with a warning) when training is not possible: no
/// usable features, no target column, a single-class target, or too few
/// rows to split.
pub fn train(features: &DataFrame, options: &TrainOptions) -> Result<Option<TrainingReport>> {
    let (matrix, target, names) = to_matrix(features)?;

    if names.is_empty() {
        tracing::warn!("no feature columns available, skipping training");
        return Ok(None);
    }
    if target.is_empty() {
        tracing::warn!("target variable 'is_merge' not found, skipping training");
        return Ok(None);
    }

    let mut class_counts: BTreeMap<i32, usize> = BTreeMap::new();
    for label in &target {
        *class_counts.entry(*label).or_default() += 1;
    }
    tracing::info!(?class_counts, "class distribution");
    if class_counts.len() < 2 {
        tracing::warn!("only one class present, cannot train classifier");
        return Ok(None);
    }
    if matrix.len() < 5 {
        tracing::warn!(rows = matrix.len(), "too few rows to split, skipping training");
        return Ok(None);
    }

    tracing::info!(features = ?names, "training with features");

    let (train_idx, test_idx) = split_indices(matrix.len(), options.test_fraction, options.seed);
    let x_train_raw: Vec<Vec<f64>> = train_idx.iter().map(|i| matrix[*i].clone()).collect();
    let x_test_raw: Vec<Vec<f64>> = test_idx.iter().map(|i| matrix[*i].clone()).collect();
    let y_train: Vec<i32> = train_idx.iter().map(|i| target[*i]).collect();
    let y_test: Vec<i32> = test_idx.iter().map(|i| target[*i]).collect();

    tracing::info!(
        train = y_train.len(),
        test = y_test.len(),
        "split complete"
    );

    let scaler = StandardScaler::fit(&x_train_raw);
    let x_train = DenseMatrix::from_2d_vec(&scaler.transform(&x_train_raw));
    let x_test = DenseMatrix::from_2d_vec(&scaler.transform(&x_test_raw));

    let parameters = RandomForestClassifierParameters::default()
        .with_n_trees(options.n_trees)
        .with_max_depth(options.max_depth)
        .with_seed(options.seed);

    let model = RandomForestClassifier::fit(&x_train, &y_train, parameters)
        .map_err(|e| MlError::Training(e.to_string()))?;

    let predicted_train = model
        .predict(&x_train)
        .map_err(|e| MlError::Training(e.to_string()))?;
    let predicted_test = model
        .predict(&x_test)
        .map_err(|e| MlError::Training(e.to_string()))?;

    let metrics = TrainingMetrics {
        train_accuracy: accuracy(&y_train, &predicted_train),
        test_accuracy: accuracy(&y_test, &predicted_test),
        test_precision: precision_weighted(&y_test, &predicted_test),
        test_recall: recall_weighted(&y_test, &predicted_test),
        test_f1: f1_weighted(&y_test, &predicted_test),
    };
    for (name, value) in metrics.as_pairs() {
        tracing::info!(metric = name, value = format!("{value:.4}"), "training metric");
    }

    let model_path = match save_artifacts(options, &model, &scaler) {
        Ok(path) => Some(path),
        Err(error) => {
            tracing::warn!(%error, "failed to persist model artifacts");
            None
        }
    };

    Ok(Some(TrainingReport {
        metrics,
        features: names,
        train_size: y_train.len(),
        test_size: y_test.len(),
        model_path,
        tracking_run_id: None,
    }))
}

/// Seeded shuffle split. The test side holds `fraction` of the rows,
/// clamped so both sides stay non-empty.
fn split_indices(rows: usize, fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = ((rows as f64 * fraction).round() as usize).clamp(1, rows - 1);
    let test = indices[..test_size].to_vec();
    let train = indices[test_size..].to_vec();
    (train, test)
}

fn save_artifacts(
    options: &TrainOptions,
    model: &RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>,
    scaler: &StandardScaler,
) -> Result<PathBuf> {
    std::fs::create_dir_all(&options.model_dir)?;
    let model_path = options.model_dir.join("commit_classifier.json");
    serde_json::to_writer(File::create(&model_path)?, model)?;
    let scaler_path = options.model_dir.join("scaler.json");
    serde_json::to_writer(File::create(&scaler_path)?, scaler)?;
    tracing::info!(path = %model_path.display(), "model saved");
    Ok(model_path)
}
