//! MLflow REST tracking client.
//!
//! Speaks the `api/2.0/mlflow` surface: experiment get-or-create, run
//! creation, batched param/metric logging, run termination. Tracking is
//! optional for the ML stage; callers treat failures as warnings.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{MlError, Result};
use crate::train::TrainingReport;

#[derive(Debug, Serialize)]
struct CreateExperimentRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct GetExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    experiment_id: &'a str,
    start_time: i64,
}

#[derive(Debug, Deserialize)]
struct CreateRunResponse {
    run: Run,
}

#[derive(Debug, Deserialize)]
struct Run {
    info: RunInfo,
}

#[derive(Debug, Deserialize)]
struct RunInfo {
    run_id: String,
}

#[derive(Debug, Serialize)]
struct LogBatchRequest<'a> {
    run_id: &'a str,
    params: Vec<Param>,
    metrics: Vec<Metric>,
}

#[derive(Debug, Serialize)]
struct Param {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct Metric {
    key: String,
    value: f64,
    timestamp: i64,
    step: i64,
}

#[derive(Debug, Serialize)]
struct UpdateRunRequest<'a> {
    run_id: &'a str,
    status: &'a str,
    end_time: i64,
}

/// Client for an MLflow-compatible tracking server.
#[derive(Debug, Clone)]
pub struct MlflowClient {
    client: reqwest::Client,
    base_url: String,
}

impl MlflowClient {
    pub fn new(tracking_uri: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| MlError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: tracking_uri.trim_end_matches('/').to_string(),
        })
    }

    /// Log one finished training run under `experiment`. Returns the run id.
    pub async fn log_training_run(
        &self,
        experiment: &str,
        report: &TrainingReport,
    ) -> Result<String> {
        let experiment_id = self.get_or_create_experiment(experiment).await?;
        let run_id = self.create_run(&experiment_id).await?;

        let now = Utc::now().timestamp_millis();
        let mut params = vec![
            Param {
                key: "model_type".to_string(),
                value: "RandomForestClassifier".to_string(),
            },
            Param {
                key: "n_features".to_string(),
                value: report.features.len().to_string(),
            },
            Param {
                key: "train_size".to_string(),
                value: report.train_size.to_string(),
            },
            Param {
                key: "test_size".to_string(),
                value: report.test_size.to_string(),
            },
        ];
        if let Some(path) = &report.model_path {
            params.push(Param {
                key: "model_path".to_string(),
                value: path.display().to_string(),
            });
        }
        let metrics = report
            .metrics
            .as_pairs()
            .into_iter()
            .map(|(key, value)| Metric {
                key: key.to_string(),
                value,
                timestamp: now,
                step: 0,
            })
            .collect();

        self.log_batch(&run_id, params, metrics).await?;
        self.finish_run(&run_id).await?;
        tracing::info!(run_id, experiment, "training run logged");
        Ok(run_id)
    }

    async fn get_or_create_experiment(&self, name: &str) -> Result<String> {
        let url = self.endpoint("experiments/get-by-name");
        let response = self
            .client
            .get(&url)
            .query(&[("experiment_name", name)])
            .send()
            .await?;

        if response.status().is_success() {
            let body: GetExperimentResponse = response.json().await?;
            return Ok(body.experiment.experiment_id);
        }
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            let url = self.endpoint("experiments/create");
            let response = self
                .client
                .post(&url)
                .json(&CreateExperimentRequest { name })
                .send()
                .await?;
            let body: CreateExperimentResponse = self.parse(response).await?;
            return Ok(body.experiment_id);
        }
        Err(self.status_error(response).await)
    }

    async fn create_run(&self, experiment_id: &str) -> Result<String> {
        let url = self.endpoint("runs/create");
        let response = self
            .client
            .post(&url)
            .json(&CreateRunRequest {
                experiment_id,
                start_time: Utc::now().timestamp_millis(),
            })
            .send()
            .await?;
        let body: CreateRunResponse = self.parse(response).await?;
        Ok(body.run.info.run_id)
    }

    async fn log_batch(&self, run_id: &str, params: Vec<Param>, metrics: Vec<Metric>) -> Result<()> {
        let url = self.endpoint("runs/log-batch");
        let response = self
            .client
            .post(&url)
            .json(&LogBatchRequest {
                run_id,
                params,
                metrics,
            })
            .send()
            .await?;
        self.ensure_success(response).await
    }

    async fn finish_run(&self, run_id: &str) -> Result<()> {
        let url = self.endpoint("runs/update");
        let response = self
            .client
            .post(&url)
            .json(&UpdateRunRequest {
                run_id,
                status: "FINISHED",
                end_time: Utc::now().timestamp_millis(),
            })
            .send()
            .await?;
        self.ensure_success(response).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/2.0/mlflow/{}", self.base_url, path)
    }

    async fn parse<T: serde::de::DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn ensure_success(&self, response: reqwest::Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }
        Ok(())
    }

    async fn status_error(&self, response: reqwest::Response) -> MlError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        MlError::Tracking { status, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        let client = MlflowClient::new("http://mlflow:5000/").unwrap();
        assert_eq!(
            client.endpoint("runs/create"),
            "http://mlflow:5000/api/2.0/mlflow/runs/create"
        );
    }

    #[test]
    fn log_batch_payload_shape() {
        let request = LogBatchRequest {
            run_id: "abc",
            params: vec![Param {
                key: "model_type".to_string(),
                value: "RandomForestClassifier".to_string(),
            }],
            metrics: vec![Metric {
                key: "test_accuracy".to_string(),
                value: 0.9,
                timestamp: 1_700_000_000_000,
                step: 0,
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["run_id"], "abc");
        assert_eq!(value["params"][0]["key"], "model_type");
        assert_eq!(value["metrics"][0]["value"], 0.9);
        assert_eq!(value["metrics"][0]["step"], 0);
    }

    #[test]
    fn run_response_parses() {
        let raw = r#"{"run": {"info": {"run_id": "r-123", "status": "RUNNING"}}}"#;
        let parsed: CreateRunResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.run.info.run_id, "r-123");
    }
}
