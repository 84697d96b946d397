//! Field-path navigation over YAML documents.
//!
//! A path is a list of segments; each segment names a mapping key, except
//! that a segment parsing as `usize` indexes into a sequence.

use serde_yaml::{Mapping, Value};

use crate::error::{AppError, Result};

/// Resolve a path to a value, without mutation.
pub fn get<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path {
        current = match current {
            Value::Mapping(map) => map.get(segment.as_str())?,
            Value::Sequence(seq) => seq.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set the value at a path, creating intermediate mappings as needed.
/// Indexing past the end of a sequence is an error; fixes are generated
/// from the current document, so their indices are expected to resolve.
pub fn set(doc: &mut Value, path: &[String], value: Value) -> Result<()> {
    let Some((head, rest)) = path.split_first() else {
        *doc = value;
        return Ok(());
    };

    match doc {
        Value::Sequence(seq) => {
            let index = head.parse::<usize>().map_err(|_| {
                AppError::Apply(format!("`{head}` is not a valid sequence index"))
            })?;
            let slot = seq.get_mut(index).ok_or_else(|| {
                AppError::Apply(format!("sequence index {index} out of bounds"))
            })?;
            set(slot, rest, value)
        }
        Value::Mapping(map) => {
            let slot = map
                .entry(Value::String(head.clone()))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            set(slot, rest, value)
        }
        other => {
            // A scalar in the middle of the path gets replaced by a mapping.
            *other = Value::Mapping(Mapping::new());
            set(other, path, value)
        }
    }
}

/// Insert the value only if the path is absent. Returns whether it inserted.
pub fn add(doc: &mut Value, path: &[String], value: Value) -> Result<bool> {
    if get(doc, path).is_some() {
        return Ok(false);
    }
    set(doc, path, value)?;
    Ok(true)
}

/// Remove the value at a path. Returns whether anything was removed.
pub fn remove(doc: &mut Value, path: &[String]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };

    let mut current = doc;
    for segment in parents {
        current = match current {
            Value::Mapping(map) => match map.get_mut(segment.as_str()) {
                Some(v) => v,
                None => return false,
            },
            Value::Sequence(seq) => {
                let Ok(index) = segment.parse::<usize>() else {
                    return false;
                };
                match seq.get_mut(index) {
                    Some(v) => v,
                    None => return false,
                }
            }
            _ => return false,
        };
    }

    match current {
        Value::Mapping(map) => map.remove(last.as_str()).is_some(),
        Value::Sequence(seq) => {
            let Ok(index) = last.parse::<usize>() else {
                return false;
            };
            if index < seq.len() {
                seq.remove(index);
                true
            } else {
                false
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn get_traverses_mappings_and_sequences() {
        let doc = doc("jobs:\n  build:\n    steps:\n      - uses: actions/checkout@v4\n");
        let value = get(&doc, &path(&["jobs", "build", "steps", "0", "uses"])).unwrap();
        assert_eq!(value.as_str(), Some("actions/checkout@v4"));
    }

    #[test]
    fn get_missing_path_is_none() {
        let doc = doc("jobs: {}\n");
        assert!(get(&doc, &path(&["jobs", "build"])).is_none());
    }

    #[test]
    fn set_creates_intermediate_mappings() {
        let mut doc = doc("name: test\n");
        set(
            &mut doc,
            &path(&["permissions", "contents"]),
            Value::String("write".into()),
        )
        .unwrap();
        let value = get(&doc, &path(&["permissions", "contents"])).unwrap();
        assert_eq!(value.as_str(), Some("write"));
    }

    #[test]
    fn set_overwrites_existing_values() {
        let mut doc = doc("on:\n  schedule:\n    - cron: '*/30 * * * *'\n");
        set(
            &mut doc,
            &path(&["on", "schedule", "0", "cron"]),
            Value::String("0 */12 * * *".into()),
        )
        .unwrap();
        let value = get(&doc, &path(&["on", "schedule", "0", "cron"])).unwrap();
        assert_eq!(value.as_str(), Some("0 */12 * * *"));
    }

    #[test]
    fn set_out_of_bounds_index_errors() {
        let mut doc = doc("steps:\n  - uses: a\n");
        let result = set(
            &mut doc,
            &path(&["steps", "5", "uses"]),
            Value::String("b".into()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn add_is_insert_if_absent() {
        let mut doc = doc("permissions:\n  contents: read\n");
        let inserted = add(
            &mut doc,
            &path(&["permissions", "contents"]),
            Value::String("write".into()),
        )
        .unwrap();
        assert!(!inserted);
        // Existing value untouched
        let value = get(&doc, &path(&["permissions", "contents"])).unwrap();
        assert_eq!(value.as_str(), Some("read"));

        let inserted = add(
            &mut doc,
            &path(&["permissions", "actions"]),
            Value::String("read".into()),
        )
        .unwrap();
        assert!(inserted);
    }

    #[test]
    fn remove_deletes_and_reports() {
        let mut doc = doc("permissions:\n  contents: write\n");
        assert!(remove(&mut doc, &path(&["permissions", "contents"])));
        assert!(!remove(&mut doc, &path(&["permissions", "contents"])));
    }
}
