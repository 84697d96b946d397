use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::classifier::{Classifier, FailureCategory};
use crate::error::Result;
use crate::fix::apply::FixApplier;
use crate::fix::generate::FixPolicy;
use crate::platform::types::WorkflowRun;
use crate::platform::ActionsHost;
use crate::report::{self, ReportEntry, ResolutionReport};

/// The resolution loop: fetch failed runs, classify each from its logs,
/// generate and apply fixes, and aggregate everything into a report.
///
/// Runs are processed sequentially in fetch order (newest failure first).
/// Parse and apply errors are recovered per run; only fetch exhaustion and
/// report persistence failures abort the whole pass.
pub struct Resolver {
    host: Arc<dyn ActionsHost>,
    classifier: Classifier,
    policy: FixPolicy,
    applier: FixApplier,
    repository: String,
    workspace_root: PathBuf,
    max_runs: usize,
    dry_run: bool,
}

impl Resolver {
    pub fn new(
        host: Arc<dyn ActionsHost>,
        repository: &str,
        workspace_root: impl Into<PathBuf>,
        max_runs: usize,
        dry_run: bool,
    ) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            host,
            classifier: Classifier::default(),
            policy: FixPolicy::new(),
            applier: FixApplier::new(workspace_root.clone(), dry_run),
            repository: repository.to_string(),
            workspace_root,
            max_runs,
            dry_run,
        }
    }

    /// Run one full resolution cycle.
    ///
    /// `is_cancelled` is checked at the top of the per-run loop; a pending
    /// cancellation stops the pass between runs, never mid-fix, and the
    /// entries collected so far still make it into the report.
    pub async fn run_cycle<F, Fut>(&self, is_cancelled: F) -> Result<ResolutionReport>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        tracing::info!(
            repository = %self.repository,
            max_runs = self.max_runs,
            dry_run = self.dry_run,
            "Starting resolution cycle"
        );

        let runs = self.host.list_failed_runs(self.max_runs).await?;
        tracing::info!(count = runs.len(), "Found failed runs to analyze");

        let mut entries = Vec::with_capacity(runs.len());

        for run in runs {
            if is_cancelled().await {
                tracing::info!("Cancellation requested, stopping before next run");
                break;
            }

            let log = match self.host.fetch_run_log(run.id).await {
                Ok(log) => log,
                Err(e) => {
                    tracing::warn!(run_id = run.id, error = %e, "Log unavailable");
                    String::new()
                }
            };

            let category = self.classifier.classify(&log);
            tracing::info!(
                run_id = run.id,
                workflow = %run.name,
                category = %category,
                "Classified run"
            );

            entries.push(self.resolve_run(&run, category));
        }

        tracing::info!(entries = entries.len(), "Resolution cycle complete");
        Ok(report::build_report(&self.repository, self.dry_run, entries))
    }

    /// Generate and apply the fix for one classified run. Every failure in
    /// here is recorded on the entry instead of aborting the batch.
    fn resolve_run(&self, run: &WorkflowRun, category: FailureCategory) -> ReportEntry {
        let mut entry = ReportEntry {
            run_id: run.id,
            workflow: run.name.clone(),
            category,
            fixes: Vec::new(),
            applied: false,
            note: None,
        };

        if matches!(
            category,
            FailureCategory::TokenInvalid | FailureCategory::Unknown
        ) {
            entry.note = Some("no automatic fix; manual review required".to_string());
            return entry;
        }

        if run.path.is_empty() {
            entry.note = Some("workflow file path unknown".to_string());
            return entry;
        }

        let workflow_path = self.workspace_root.join(&run.path);
        let text = match std::fs::read_to_string(&workflow_path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(run_id = run.id, file = %run.path, error = %e, "Could not read workflow file");
                entry.note = Some(format!("could not read workflow file: {e}"));
                return entry;
            }
        };

        let doc = match serde_yaml::from_str(&text) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(run_id = run.id, file = %run.path, error = %e, "Workflow file is not valid YAML");
                entry.note = Some(format!("workflow file is not valid YAML: {e}"));
                return entry;
            }
        };

        let Some(fix) = self
            .policy
            .generate_fix(category, Path::new(&run.path), &doc)
        else {
            entry.note = Some("configuration already satisfies the fix".to_string());
            return entry;
        };

        tracing::debug!(run_id = run.id, fix = %fix.describe(), "Generated fix");

        match self.applier.apply(&fix) {
            Ok(applied) => {
                entry.applied = applied;
                if !applied {
                    entry.note = Some("dry run; fix not applied".to_string());
                }
            }
            Err(e) => {
                tracing::warn!(run_id = run.id, error = %e, "Failed to apply fix");
                entry.note = Some(format!("could not fix: {e}"));
            }
        }
        entry.fixes.push(fix);

        entry
    }
}
