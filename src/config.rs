use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_repo")]
    pub repo: String,
    #[serde(default)]
    pub token: String,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            token: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    #[serde(default = "default_max_runs")]
    pub max_runs: usize,
    /// Root of the checked-out repository whose workflow files get patched.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_runs: default_max_runs(),
            workspace_dir: default_workspace_dir(),
            report_dir: default_report_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

fn default_owner() -> String {
    "xepoctpat".to_string()
}

fn default_repo() -> String {
    "xepoctpat".to_string()
}

fn default_max_runs() -> usize {
    10
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Try default paths
            builder = builder.add_source(
                config::File::with_name("ci-medic")
                    .required(false),
            );
        }

        // Environment variable overrides with CI_MEDIC_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("CI_MEDIC")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// The `owner/repo` slug the agent operates on.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.github.owner, self.github.repo)
    }
}
