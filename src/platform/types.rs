use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conclusion of a completed workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Failure,
    Success,
    Cancelled,
    Other,
}

/// One recorded execution attempt of a workflow.
///
/// Log text is deliberately not part of this type; it may be large and is
/// fetched lazily via [`crate::platform::ActionsHost::fetch_run_log`].
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: String,
    /// Path of the workflow file within the repository,
    /// e.g. `.github/workflows/metrics.yml`.
    pub path: String,
    pub conclusion: RunConclusion,
    pub created_at: DateTime<Utc>,
}

/// A job within a run. Only the failed jobs have their logs fetched.
#[derive(Debug, Clone)]
pub struct RunJob {
    pub id: u64,
    pub name: String,
    pub conclusion: RunConclusion,
}
