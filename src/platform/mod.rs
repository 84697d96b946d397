pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::WorkflowRun;

#[async_trait]
pub trait ActionsHost: Send + Sync {
    /// List the most recent workflow runs that concluded in failure,
    /// newest first, truncated to `max_count`.
    async fn list_failed_runs(&self, max_count: usize) -> Result<Vec<WorkflowRun>>;

    /// Fetch the combined log text of a run's failed jobs.
    ///
    /// Returns an empty string when no log is available; the classifier
    /// treats that as an unknown failure rather than an error.
    async fn fetch_run_log(&self, run_id: u64) -> Result<String>;
}
