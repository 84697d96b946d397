use std::time::Duration;

use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::Client;

use crate::config::{FetchConfig, GitHubConfig};
use crate::error::{AppError, Result};
use crate::platform::types::{RunConclusion, WorkflowRun};
use crate::platform::ActionsHost;

use super::mapper;

const GITHUB_API_URL: &str = "https://api.github.com";

pub struct GitHubActionsHost {
    octocrab: Octocrab,
    http: Client,
    owner: String,
    repo: String,
    token: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl GitHubActionsHost {
    pub fn new(github: &GitHubConfig, fetch: &FetchConfig) -> Result<Self> {
        if github.token.is_empty() {
            return Err(AppError::Config(
                "GitHub token is required: pass --token or set GITHUB_TOKEN".to_string(),
            ));
        }

        let octocrab = Octocrab::builder()
            .personal_token(github.token.clone())
            .build()
            .map_err(|e| AppError::Fetch(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self {
            octocrab,
            http: Client::new(),
            owner: github.owner.clone(),
            repo: github.repo.clone(),
            token: github.token.clone(),
            max_retries: fetch.max_retries,
            initial_backoff: Duration::from_millis(fetch.initial_backoff_ms),
        })
    }

    /// GET a JSON endpoint, retrying with exponential backoff when the API
    /// reports rate limiting. Exhausted retries surface as `RateLimitExceeded`.
    async fn get_json(&self, route: &str) -> Result<serde_json::Value> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0u32;

        loop {
            let result: std::result::Result<serde_json::Value, octocrab::Error> =
                self.octocrab.get(route, None::<&()>).await;
            match result {
                Ok(value) => return Ok(value),
                Err(e) if is_rate_limited(&e) => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        return Err(AppError::RateLimitExceeded(e.to_string()));
                    }
                    tracing::warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "GitHub API rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(AppError::Fetch(e.to_string())),
            }
        }
    }

    /// Fetch the plain-text log of a single job.
    ///
    /// octocrab has no typed endpoint for this; the API answers with a
    /// redirect to a signed blob URL, which reqwest follows automatically.
    async fn fetch_job_log(&self, job_id: u64) -> Result<String> {
        let url = format!(
            "{GITHUB_API_URL}/repos/{}/{}/actions/jobs/{job_id}/logs",
            self.owner, self.repo
        );

        let mut backoff = self.initial_backoff;
        let mut attempt = 0u32;

        loop {
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .header("User-Agent", "ci-medic")
                .header("Accept", "application/vnd.github+json")
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response.text().await?);
            }

            if status.as_u16() == 429 || status.as_u16() == 403 {
                attempt += 1;
                if attempt >= self.max_retries {
                    return Err(AppError::RateLimitExceeded(format!(
                        "Log request for job {job_id} returned {status}"
                    )));
                }
                tracing::warn!(
                    job_id,
                    attempt,
                    %status,
                    "Job log request throttled, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            // Expired or missing logs are not an error; classify as unknown.
            tracing::debug!(job_id, %status, "Job log unavailable");
            return Ok(String::new());
        }
    }
}

#[async_trait]
impl ActionsHost for GitHubActionsHost {
    async fn list_failed_runs(&self, max_count: usize) -> Result<Vec<WorkflowRun>> {
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let route = format!(
            "/repos/{}/{}/actions/runs?status=failure&per_page={}",
            self.owner,
            self.repo,
            max_count.min(100)
        );

        let response = self.get_json(&route).await?;

        let runs = response["workflow_runs"]
            .as_array()
            .map(|runs| {
                runs.iter()
                    .filter_map(mapper::map_run)
                    .take(max_count)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        tracing::debug!(count = runs.len(), "Fetched failed workflow runs");
        Ok(runs)
    }

    async fn fetch_run_log(&self, run_id: u64) -> Result<String> {
        let route = format!(
            "/repos/{}/{}/actions/runs/{run_id}/jobs?per_page=100",
            self.owner, self.repo
        );

        let response = self.get_json(&route).await?;
        let jobs = mapper::map_jobs(&response);

        let mut combined = String::new();
        for job in jobs.iter().filter(|j| j.conclusion == RunConclusion::Failure) {
            tracing::debug!(run_id, job_id = job.id, job = %job.name, "Fetching job log");
            let log = self.fetch_job_log(job.id).await?;
            if !log.is_empty() {
                combined.push_str(&log);
                combined.push('\n');
            }
        }

        Ok(combined)
    }
}

fn is_rate_limited(err: &octocrab::Error) -> bool {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            status == 429
                || (status == 403 && source.message.to_lowercase().contains("rate limit"))
        }
        _ => false,
    }
}
