use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

pub mod batch;

pub use batch::{table_from_batches, table_to_batch};

/// A single cell of a profile table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float64(f64),
    Int64(i64),
    Bool(bool),
    Null,
}

impl Value {
    /// Render the value as a group identifier. Nulls become `"null"`.
    pub fn as_group_id(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Null => Ok(()),
        }
    }
}

/// One sample: its identifier plus one value per table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("duplicate row identifier '{0}'")]
    DuplicateId(String),
    #[error("row '{id}' has {found} values, expected {expected}")]
    RowWidth {
        id: String,
        expected: usize,
        found: usize,
    },
    #[error("row {0} has an empty identifier")]
    MissingId(usize),
    #[error("table has no columns")]
    NoColumns,
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

/// In-memory profile: ordered rows keyed by a unique sample identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
    ids: HashSet<String>,
}

impl Table {
    pub fn new(index_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            columns,
            rows: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub fn push_row(&mut self, id: String, values: Vec<Value>) -> Result<(), TableError> {
        if values.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                id,
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        if !self.ids.insert(id.clone()) {
            return Err(TableError::DuplicateId(id));
        }
        self.rows.push(Row { id, values });
        Ok(())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[cfg(test)]
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Sample identifiers in row order.
    pub fn sample_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(|r| r.id.as_str())
    }

    /// `(sample_id, value)` pairs for one column, in row order.
    pub fn column_values<'a>(
        &'a self,
        name: &str,
    ) -> Option<impl Iterator<Item = (&'a str, &'a Value)> + 'a> {
        let idx = self.column_position(name)?;
        Some(self.rows.iter().map(move |r| (r.id.as_str(), &r.values[idx])))
    }

    /// Remove a column from the schema and from every row.
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_position(name)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|r| r.values.remove(idx)).collect())
    }

    /// Rows whose identifier is in `members`, kept in table order.
    pub fn select(&self, members: &[String]) -> Table {
        let wanted: HashSet<&str> = members.iter().map(String::as_str).collect();
        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|r| wanted.contains(r.id.as_str()))
            .cloned()
            .collect();
        Table {
            index_name: self.index_name.clone(),
            columns: self.columns.clone(),
            ids: rows.iter().map(|r| r.id.clone()).collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::String(v.to_string())).collect()
    }

    fn sample_table() -> Table {
        let mut table = Table::new("id", vec!["site".into(), "locus1".into()]);
        table.push_row("A".into(), strings(&["north", "1"])).unwrap();
        table.push_row("B".into(), strings(&["south", "2"])).unwrap();
        table.push_row("C".into(), strings(&["north", "3"])).unwrap();
        table
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut table = sample_table();
        let err = table.push_row("A".into(), strings(&["x", "y"])).unwrap_err();
        assert!(matches!(err, TableError::DuplicateId(id) if id == "A"));
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut table = sample_table();
        let err = table.push_row("D".into(), strings(&["x"])).unwrap_err();
        assert!(matches!(err, TableError::RowWidth { expected: 2, found: 1, .. }));
    }

    #[test]
    fn drop_column_removes_values_everywhere() {
        let mut table = sample_table();
        let dropped = table.drop_column("site").unwrap();
        assert_eq!(dropped, strings(&["north", "south", "north"]));
        assert_eq!(table.columns(), &["locus1".to_string()]);
        assert!(table.rows().iter().all(|r| r.values.len() == 1));
        assert!(table.drop_column("site").is_none());
    }

    #[test]
    fn select_keeps_table_order() {
        let table = sample_table();
        let slice = table.select(&["C".to_string(), "A".to_string()]);
        let ids: Vec<&str> = slice.sample_ids().collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert!(slice.contains_id("C"));
        assert!(!slice.contains_id("B"));
    }

    #[test]
    fn null_renders_as_group_id() {
        assert_eq!(Value::Null.as_group_id(), "null");
        assert_eq!(Value::Int64(7).as_group_id(), "7");
        assert_eq!(Value::Null.to_string(), "");
    }
}
