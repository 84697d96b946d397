use chrono::{DateTime, Utc};

use crate::platform::types::{RunConclusion, RunJob, WorkflowRun};

/// Map one entry of the `workflow_runs` array to our run type.
/// Returns `None` for entries without a numeric id.
pub fn map_run(value: &serde_json::Value) -> Option<WorkflowRun> {
    let id = value["id"].as_u64()?;

    Some(WorkflowRun {
        id,
        name: value["name"].as_str().unwrap_or("unknown").to_string(),
        path: value["path"].as_str().unwrap_or_default().to_string(),
        conclusion: map_conclusion(value["conclusion"].as_str()),
        created_at: value["created_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now),
    })
}

/// Map the `jobs` array of a run's jobs response.
pub fn map_jobs(response: &serde_json::Value) -> Vec<RunJob> {
    response["jobs"]
        .as_array()
        .map(|jobs| {
            jobs.iter()
                .filter_map(|job| {
                    Some(RunJob {
                        id: job["id"].as_u64()?,
                        name: job["name"].as_str().unwrap_or("unknown").to_string(),
                        conclusion: map_conclusion(job["conclusion"].as_str()),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn map_conclusion(raw: Option<&str>) -> RunConclusion {
    match raw {
        Some("failure") => RunConclusion::Failure,
        Some("success") => RunConclusion::Success,
        Some("cancelled") => RunConclusion::Cancelled,
        _ => RunConclusion::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_a_run_entry() {
        let value = json!({
            "id": 42,
            "name": "Metrics",
            "path": ".github/workflows/metrics.yml",
            "conclusion": "failure",
            "created_at": "2024-05-01T12:00:00Z"
        });

        let run = map_run(&value).unwrap();
        assert_eq!(run.id, 42);
        assert_eq!(run.name, "Metrics");
        assert_eq!(run.path, ".github/workflows/metrics.yml");
        assert_eq!(run.conclusion, RunConclusion::Failure);
    }

    #[test]
    fn skips_entries_without_id() {
        let value = json!({ "name": "Broken" });
        assert!(map_run(&value).is_none());
    }

    #[test]
    fn maps_jobs_and_unknown_conclusions() {
        let response = json!({
            "jobs": [
                { "id": 1, "name": "build", "conclusion": "failure" },
                { "id": 2, "name": "lint", "conclusion": "timed_out" }
            ]
        });

        let jobs = map_jobs(&response);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].conclusion, RunConclusion::Failure);
        assert_eq!(jobs[1].conclusion, RunConclusion::Other);
    }
}
