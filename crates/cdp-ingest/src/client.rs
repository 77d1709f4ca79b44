//! GitHub API client for fetching commit listings.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};

use crate::error::{IngestError, Result};
use crate::types::RawCommit;

/// GitHub API base URL.
const GITHUB_API_URL: &str = "https://api.github.com";

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("commit-data-platform/", env!("CARGO_PKG_VERSION"));

/// GitHub API client for fetching commit metadata.
#[derive(Debug, Clone)]
pub struct GitHubCommitsClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubCommitsClient {
    /// Creates a new client. A token (e.g. from `GITHUB_TOKEN`) raises the
    /// rate limit but is not required for public repositories.
    pub fn new(token: Option<&str>) -> Result<Self> {
        Self::with_base_url(GITHUB_API_URL, token)
    }

    /// Creates a client against a custom API root (used by tests).
    pub fn with_base_url(base_url: impl Into<String>, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| IngestError::Network(format!("invalid token header: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| IngestError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetches the most recent commits of `owner/repo`.
    pub async fn list_commits(&self, repo: &str, per_page: u32) -> Result<Vec<RawCommit>> {
        let url = format!("{}/repos/{}/commits", self.base_url, repo);

        tracing::debug!(repo, per_page, "fetching commits from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("per_page", per_page.to_string())])
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Handles the HTTP response, checking for errors and parsing JSON.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Vec<RawCommit>> {
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .is_some_and(|remaining| remaining.to_str().unwrap_or("1") == "0")
        {
            let retry_after = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|reset| {
                    let now = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0);
                    reset.saturating_sub(now)
                })
                .unwrap_or(60);

            return Err(IngestError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let commits: Vec<RawCommit> = response.json().await?;
        Ok(commits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GitHubCommitsClient::new(None);
        assert!(client.is_ok());

        let client = GitHubCommitsClient::new(Some("ghp_example"));
        assert!(client.is_ok());
    }
}
