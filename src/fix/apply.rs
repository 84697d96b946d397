use std::io::Write;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::{AppError, Result};
use crate::fix::{yaml_path, FixAction, FixOp};

/// Applies fix actions to workflow files under the workspace root.
pub struct FixApplier {
    workspace_root: PathBuf,
    dry_run: bool,
}

impl FixApplier {
    pub fn new(workspace_root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            dry_run,
        }
    }

    /// Apply one fix. Returns whether the file was mutated.
    ///
    /// In dry-run mode nothing is touched and `false` comes back. Otherwise
    /// the target is re-read, patched, and replaced atomically; a failed
    /// write leaves the original file intact.
    pub fn apply(&self, fix: &FixAction) -> Result<bool> {
        if self.dry_run {
            tracing::info!(file = %fix.file.display(), "Dry run, skipping fix application");
            return Ok(false);
        }

        let path = self.workspace_root.join(&fix.file);

        let text = std::fs::read_to_string(&path)
            .map_err(|e| AppError::Apply(format!("Failed to read {}: {e}", path.display())))?;

        let mut doc: Value = serde_yaml::from_str(&text)
            .map_err(|e| AppError::ConfigParse(format!("{}: {e}", path.display())))?;

        match &fix.op {
            FixOp::SetField { value } => {
                yaml_path::set(&mut doc, &fix.field_path, value.clone())?;
            }
            FixOp::AddField { value } => {
                yaml_path::add(&mut doc, &fix.field_path, value.clone())?;
            }
            FixOp::RemoveField => {
                yaml_path::remove(&mut doc, &fix.field_path);
            }
        }

        let rendered = serde_yaml::to_string(&doc)?;
        write_atomic(&path, &rendered)?;

        tracing::info!(file = %fix.file.display(), "Applied fix");
        Ok(true)
    }
}

/// Write-to-temp-then-rename in the destination directory, so the
/// replacement is all-or-nothing.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| AppError::Apply(format!("{} has no parent directory", path.display())))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| AppError::Apply(format!("Failed to create temp file: {e}")))?;

    tmp.write_all(contents.as_bytes())
        .map_err(|e| AppError::Apply(format!("Failed to write temp file: {e}")))?;

    tmp.persist(path)
        .map_err(|e| AppError::Apply(format!("Failed to replace {}: {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn permission_fix() -> FixAction {
        FixAction {
            file: PathBuf::from("wf.yml"),
            field_path: vec!["permissions".to_string(), "contents".to_string()],
            op: FixOp::AddField {
                value: Value::String("write".to_string()),
            },
        }
    }

    #[test]
    fn dry_run_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wf.yml");
        let original = "name: test\njobs: {}\n";
        std::fs::write(&path, original).unwrap();

        let applier = FixApplier::new(dir.path(), true);
        let applied = applier.apply(&permission_fix()).unwrap();

        assert!(!applied);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wf.yml");
        std::fs::write(&path, "name: test\njobs: {}\n").unwrap();

        let applier = FixApplier::new(dir.path(), false);
        assert!(applier.apply(&permission_fix()).unwrap());
        let after_once = std::fs::read_to_string(&path).unwrap();

        assert!(applier.apply(&permission_fix()).unwrap());
        let after_twice = std::fs::read_to_string(&path).unwrap();

        assert_eq!(after_once, after_twice);
        assert!(after_once.contains("contents: write"));
    }

    #[test]
    fn missing_file_is_an_apply_error() {
        let dir = tempfile::tempdir().unwrap();
        let applier = FixApplier::new(dir.path(), false);

        let err = applier.apply(&permission_fix()).unwrap_err();
        assert!(matches!(err, AppError::Apply(_)));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wf.yml");
        std::fs::write(&path, "jobs: [unclosed\n").unwrap();

        let applier = FixApplier::new(dir.path(), false);
        let err = applier.apply(&permission_fix()).unwrap_err();
        assert!(matches!(err, AppError::ConfigParse(_)));
    }

    #[test]
    fn set_field_rewrites_action_ref() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wf.yml");
        std::fs::write(
            &path,
            "jobs:\n  update:\n    steps:\n      - uses: lowlighter/metrics@master\n",
        )
        .unwrap();

        let fix = FixAction {
            file: PathBuf::from("wf.yml"),
            field_path: vec![
                "jobs".to_string(),
                "update".to_string(),
                "steps".to_string(),
                "0".to_string(),
                "uses".to_string(),
            ],
            op: FixOp::SetField {
                value: Value::String("lowlighter/metrics@v3.34".to_string()),
            },
        };

        let applier = FixApplier::new(dir.path(), false);
        assert!(applier.apply(&fix).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("lowlighter/metrics@v3.34"));
        assert!(!content.contains("@master"));
    }
}
