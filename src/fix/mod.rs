pub mod apply;
pub mod generate;
pub mod yaml_path;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Operation a fix performs at a field path within a workflow file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FixOp {
    /// Overwrite (or create) the field with the given value.
    SetField { value: serde_yaml::Value },
    /// Insert the field only if it is absent; existing values are left alone.
    AddField { value: serde_yaml::Value },
    /// Remove the field if present.
    RemoveField,
}

/// A declarative, idempotent patch targeting one workflow file.
///
/// Applying the same action twice leaves the file in the same state as
/// applying it once; the agent may re-run against files it already fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixAction {
    /// Path of the workflow file, relative to the workspace root.
    pub file: PathBuf,
    /// Dot-path into the YAML document; numeric segments index sequences.
    pub field_path: Vec<String>,
    pub op: FixOp,
}

impl FixAction {
    /// One-line human-readable description for the report.
    pub fn describe(&self) -> String {
        let path = self.field_path.join(".");
        let file = self.file.display();
        match &self.op {
            FixOp::SetField { value } => {
                format!("set `{path}` to `{}` in {file}", render_value(value))
            }
            FixOp::AddField { value } => {
                format!("add `{path}: {}` to {file}", render_value(value))
            }
            FixOp::RemoveField => format!("remove `{path}` from {file}"),
        }
    }
}

fn render_value(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| "<value>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_set_field() {
        let fix = FixAction {
            file: PathBuf::from(".github/workflows/metrics.yml"),
            field_path: vec!["jobs".into(), "metrics".into(), "steps".into(), "0".into(), "uses".into()],
            op: FixOp::SetField {
                value: serde_yaml::Value::String("lowlighter/metrics@v3.34".into()),
            },
        };
        let text = fix.describe();
        assert!(text.contains("jobs.metrics.steps.0.uses"));
        assert!(text.contains("lowlighter/metrics@v3.34"));
    }
}
