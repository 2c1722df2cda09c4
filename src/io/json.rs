use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::error::{Result, SplitError};
use crate::table::{Table, Value};

fn read_object(path: &Path) -> Result<Map<String, JsonValue>> {
    let file = File::open(path).map_err(|e| SplitError::load(path.display(), e))?;
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(_) => Err(SplitError::load(path.display(), "expected a JSON object")),
        Err(e) => Err(SplitError::load(path.display(), e)),
    }
}

/// Read `{"sample_id": group_id, ...}` into a two-column membership table.
pub fn read_memberships(path: &Path) -> Result<Table> {
    let map = read_object(path)?;
    let mut table = Table::new("sample_id", vec!["partition".to_string()]);
    for (id, group) in map {
        let value = match group {
            JsonValue::String(s) => Value::String(s),
            JsonValue::Number(n) => Value::String(n.to_string()),
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Null => Value::Null,
            _ => {
                return Err(SplitError::load(
                    path.display(),
                    format!("group id for sample '{}' must be a scalar", id),
                ))
            }
        };
        table
            .push_row(id, vec![value])
            .map_err(|e| SplitError::load(path.display(), e))?;
    }
    Ok(table)
}

/// Load a user supplied allele mapping; it is passed through unchanged.
pub fn load_allele_map(path: &Path) -> Result<JsonValue> {
    read_object(path).map(JsonValue::Object)
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| SplitError::output(path.display(), e))?;
    fs::write(path, json).map_err(|e| SplitError::output(path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_string_and_numeric_group_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.json");
        fs::write(&path, r#"{"A": "north", "B": 2, "C": "north"}"#).unwrap();

        let table = read_memberships(&path).unwrap();
        let groups: Vec<(String, String)> = table
            .column_values("partition")
            .unwrap()
            .map(|(id, v)| (id.to_string(), v.as_group_id()))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("A".to_string(), "north".to_string()),
                ("B".to_string(), "2".to_string()),
                ("C".to_string(), "north".to_string()),
            ]
        );
    }

    #[test]
    fn nested_group_ids_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.json");
        fs::write(&path, r#"{"A": {"nested": true}, "B": "south"}"#).unwrap();
        assert!(matches!(
            read_memberships(&path),
            Err(SplitError::Load { .. })
        ));
    }

    #[test]
    fn allele_map_must_be_an_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(load_allele_map(&path).is_err());

        fs::write(&path, r#"{"locus1": {"abc": 1}}"#).unwrap();
        let map = load_allele_map(&path).unwrap();
        assert_eq!(map["locus1"]["abc"], 1);
    }
}
