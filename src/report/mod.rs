use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classifier::FailureCategory;
use crate::error::{AppError, Result};
use crate::fix::FixAction;

/// Outcome of one run's pass through the resolution loop.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub run_id: u64,
    pub workflow: String,
    pub category: FailureCategory,
    pub fixes: Vec<FixAction>,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The audit trail of one agent invocation. Built once at the end of the
/// pass and never mutated after it is written out.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub repository: String,
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    pub entries: Vec<ReportEntry>,
    /// Number of analyzed runs per failure category.
    pub summary: BTreeMap<FailureCategory, usize>,
}

/// Aggregate the collected entries into a report with per-category counts.
pub fn build_report(repository: &str, dry_run: bool, entries: Vec<ReportEntry>) -> ResolutionReport {
    let mut summary = BTreeMap::new();
    for entry in &entries {
        *summary.entry(entry.category).or_insert(0) += 1;
    }

    ResolutionReport {
        repository: repository.to_string(),
        generated_at: Utc::now(),
        dry_run,
        entries,
        summary,
    }
}

impl ResolutionReport {
    /// Write the report to `report_dir` as a JSON artifact plus a Markdown
    /// summary. Returns the two paths. Any failure here is fatal for the
    /// invocation; the report is the sole audit trail.
    pub fn persist(&self, report_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let stem = format!(
            "ci-resolution-report-{}",
            self.generated_at.format("%Y%m%d_%H%M%S")
        );
        let json_path = report_dir.join(format!("{stem}.json"));
        let md_path = report_dir.join(format!("{stem}.md"));

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::ReportPersist(e.to_string()))?;
        std::fs::write(&json_path, json)
            .map_err(|e| AppError::ReportPersist(format!("{}: {e}", json_path.display())))?;

        std::fs::write(&md_path, self.to_markdown())
            .map_err(|e| AppError::ReportPersist(format!("{}: {e}", md_path.display())))?;

        Ok((json_path, md_path))
    }

    /// Human-readable summary, mirrored into the Markdown artifact and
    /// printed at the end of a run.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# CI/CD Failure Resolution Report\n\n");
        out.push_str(&format!(
            "Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!("Repository: {}\n", self.repository));
        if self.dry_run {
            out.push_str("Mode: dry run (no files were modified)\n");
        }
        out.push('\n');

        if self.entries.is_empty() {
            out.push_str("No recent failed runs found.\n");
            return out;
        }

        out.push_str("## Issues Identified\n\n");
        for (category, count) in &self.summary {
            out.push_str(&format!("### {category} ({count})\n\n"));
            for entry in self.entries.iter().filter(|e| e.category == *category) {
                out.push_str(&format!("- run {} (`{}`)", entry.run_id, entry.workflow));
                if let Some(note) = &entry.note {
                    out.push_str(&format!(": {note}"));
                }
                out.push('\n');
            }
            out.push('\n');
        }

        out.push_str("## Fixes\n\n");
        let mut any_fix = false;
        for entry in &self.entries {
            for fix in &entry.fixes {
                any_fix = true;
                let status = if entry.applied { "APPLIED" } else { "SKIPPED" };
                out.push_str(&format!("- {status}: {}\n", fix.describe()));
            }
        }
        if !any_fix {
            out.push_str("No fixes were generated.\n");
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(run_id: u64, category: FailureCategory, applied: bool) -> ReportEntry {
        ReportEntry {
            run_id,
            workflow: "Metrics".to_string(),
            category,
            fixes: Vec::new(),
            applied,
            note: None,
        }
    }

    #[test]
    fn summary_counts_per_category() {
        let report = build_report(
            "owner/repo",
            false,
            vec![
                entry(1, FailureCategory::RateLimit, true),
                entry(2, FailureCategory::RateLimit, false),
                entry(3, FailureCategory::Unknown, false),
            ],
        );

        assert_eq!(report.summary[&FailureCategory::RateLimit], 2);
        assert_eq!(report.summary[&FailureCategory::Unknown], 1);
    }

    #[test]
    fn empty_report_renders_cleanly() {
        let report = build_report("owner/repo", false, Vec::new());
        let md = report.to_markdown();
        assert!(md.contains("No recent failed runs found."));
        assert_eq!(report.entries.len(), 0);
    }

    #[test]
    fn markdown_mentions_dry_run_mode() {
        let report = build_report("owner/repo", true, vec![entry(1, FailureCategory::RateLimit, false)]);
        let md = report.to_markdown();
        assert!(md.contains("dry run"));
        assert!(md.contains("rate-limit (1)"));
    }

    #[test]
    fn persist_writes_json_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let report = build_report("owner/repo", false, vec![entry(1, FailureCategory::Unknown, false)]);

        let (json_path, md_path) = report.persist(dir.path()).unwrap();
        assert!(json_path.exists());
        assert!(md_path.exists());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["repository"], "owner/repo");
        assert_eq!(json["summary"]["unknown"], 1);
    }

    #[test]
    fn persist_to_missing_directory_is_fatal() {
        let report = build_report("owner/repo", false, Vec::new());
        let err = report
            .persist(Path::new("/nonexistent/report/dir"))
            .unwrap_err();
        assert!(matches!(err, AppError::ReportPersist(_)));
    }
}
