use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to fetch workflow runs: {0}")]
    Fetch(String),

    #[error("GitHub API rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Workflow file is not valid YAML: {0}")]
    ConfigParse(String),

    #[error("Failed to apply fix: {0}")]
    Apply(String),

    #[error("Failed to persist resolution report: {0}")]
    ReportPersist(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::Fetch(e.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> Self {
        AppError::ConfigParse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
