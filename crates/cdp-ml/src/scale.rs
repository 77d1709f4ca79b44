//! Per-column standardization fitted on the training split.

use serde::{Deserialize, Serialize};

/// Zero-mean unit-variance scaling. Columns with zero variance are left
/// centered but unscaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let count = rows.len().max(1) as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= count;
        }

        let mut stds = vec![0.0; width];
        for row in rows {
            for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
                let delta = value - mean;
                *std += delta * delta;
            }
        }
        for std in &mut stds {
            *std = (*std / count).sqrt();
            if *std == 0.0 {
                *std = 1.0;
            }
        }

        Self { means, stds }
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(&self.means)
                    .zip(&self.stds)
                    .map(|((value, mean), std)| (value - mean) / std)
                    .collect()
            })
            .collect()
    }
}
