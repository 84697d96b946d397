use std::collections::BTreeMap;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::classifier::FailureCategory;
use crate::fix::{yaml_path, FixAction, FixOp};

/// Fixed policy mapping a failure category to at most one patch.
///
/// `generate_fix` is pure: it inspects the current document and returns
/// `None` whenever the document already satisfies the fix, so re-running
/// the agent against already-fixed files produces no further actions.
pub struct FixPolicy {
    /// Actions known to break on floating refs, pinned to stable versions.
    pins: BTreeMap<&'static str, &'static str>,
    /// Replacement cron interval for rate-limited scheduled workflows.
    widened_cron: &'static str,
}

impl FixPolicy {
    pub fn new() -> Self {
        let mut pins = BTreeMap::new();
        pins.insert("jamesgeorge007/github-activity-readme", "v1.6.4");
        pins.insert("lowlighter/metrics", "v3.34");
        pins.insert("actions/checkout", "v4");
        pins.insert("actions/setup-node", "v4");

        Self {
            pins,
            widened_cron: "0 */12 * * *",
        }
    }

    /// Generate the patch for a classified failure, given the current
    /// workflow document. Token failures and unknown failures produce no
    /// fix; they are flagged for manual review in the report.
    pub fn generate_fix(
        &self,
        category: FailureCategory,
        workflow_path: &Path,
        doc: &Value,
    ) -> Option<FixAction> {
        match category {
            FailureCategory::DeprecatedActionVersion => self.pin_action(workflow_path, doc),
            FailureCategory::MissingPermission => self.grant_contents_write(workflow_path, doc),
            FailureCategory::UnsupportedLanguage => self.disable_auto_trigger(workflow_path, doc),
            FailureCategory::RateLimit => self.widen_schedule(workflow_path, doc),
            FailureCategory::TokenInvalid | FailureCategory::Unknown => None,
        }
    }

    /// Re-pin the first step that references a known action at a ref other
    /// than its pinned stable version.
    fn pin_action(&self, workflow_path: &Path, doc: &Value) -> Option<FixAction> {
        let jobs = doc.get("jobs")?.as_mapping()?;

        for (job_name, job) in jobs {
            let job_name = job_name.as_str()?;
            let Some(steps) = job.get("steps").and_then(Value::as_sequence) else {
                continue;
            };

            for (index, step) in steps.iter().enumerate() {
                let Some(uses) = step.get("uses").and_then(Value::as_str) else {
                    continue;
                };
                let (action, current_ref) = match uses.split_once('@') {
                    Some((action, r)) => (action, Some(r)),
                    None => (uses, None),
                };
                let Some(pinned) = self.pins.get(action) else {
                    continue;
                };
                if current_ref == Some(pinned) {
                    continue;
                }

                return Some(FixAction {
                    file: workflow_path.to_path_buf(),
                    field_path: vec![
                        "jobs".to_string(),
                        job_name.to_string(),
                        "steps".to_string(),
                        index.to_string(),
                        "uses".to_string(),
                    ],
                    op: FixOp::SetField {
                        value: Value::String(format!("{action}@{pinned}")),
                    },
                });
            }
        }

        None
    }

    /// Grant the minimal scope the failing run was missing. Workflow-level
    /// `permissions` applies to every job, so one field covers them all.
    fn grant_contents_write(&self, workflow_path: &Path, doc: &Value) -> Option<FixAction> {
        let field_path = vec!["permissions".to_string(), "contents".to_string()];
        let desired = Value::String("write".to_string());

        match yaml_path::get(doc, &field_path) {
            Some(current) if *current == desired => None,
            Some(_) => Some(FixAction {
                file: workflow_path.to_path_buf(),
                field_path,
                op: FixOp::SetField { value: desired },
            }),
            None => Some(FixAction {
                file: workflow_path.to_path_buf(),
                field_path,
                op: FixOp::AddField { value: desired },
            }),
        }
    }

    /// Leave only the manual trigger: the analysis has nothing to scan, so
    /// automatic runs can only fail again.
    fn disable_auto_trigger(&self, workflow_path: &Path, doc: &Value) -> Option<FixAction> {
        let mut triggers = Mapping::new();
        triggers.insert(Value::String("workflow_dispatch".to_string()), Value::Null);
        let desired = Value::Mapping(triggers);

        if doc.get("on") == Some(&desired) {
            return None;
        }

        Some(FixAction {
            file: workflow_path.to_path_buf(),
            field_path: vec!["on".to_string()],
            op: FixOp::SetField { value: desired },
        })
    }

    /// Widen the schedule of a cron-triggered workflow that keeps tripping
    /// rate limits. Workflows without a schedule have nothing to widen.
    fn widen_schedule(&self, workflow_path: &Path, doc: &Value) -> Option<FixAction> {
        let field_path = vec![
            "on".to_string(),
            "schedule".to_string(),
            "0".to_string(),
            "cron".to_string(),
        ];

        let current = yaml_path::get(doc, &field_path)?.as_str()?;
        if current == self.widened_cron {
            return None;
        }

        Some(FixAction {
            file: workflow_path.to_path_buf(),
            field_path,
            op: FixOp::SetField {
                value: Value::String(self.widened_cron.to_string()),
            },
        })
    }
}

impl Default for FixPolicy {
    fn default() -> Self {
        Self::new()
    }
}
