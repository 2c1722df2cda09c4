use arrow::array::*;
use arrow::datatypes::*;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use serde::Deserialize;
use std::sync::Arc;

use super::{Table, TableError, Value};

/// Column name pandas-style writers use for an unnamed stored row index.
pub const INDEX_COLUMN: &str = "__index_level_0__";

/// Schema metadata key under which pandas records its index layout.
pub const PANDAS_METADATA_KEY: &str = "pandas";

#[derive(Debug, Deserialize)]
struct PandasMetadata {
    #[serde(default)]
    index_columns: Vec<serde_json::Value>,
}

/// Name of the first stored index column recorded in pandas metadata.
///
/// Range indexes are recorded as objects and have no backing column.
fn pandas_index_column(schema: &Schema) -> Option<String> {
    let raw = schema.metadata().get(PANDAS_METADATA_KEY)?;
    let meta: PandasMetadata = serde_json::from_str(raw).ok()?;
    match meta.index_columns.into_iter().next()? {
        serde_json::Value::String(name) => Some(name),
        _ => None,
    }
}

fn index_position(schema: &Schema) -> usize {
    let position = |name: &str| schema.fields().iter().position(|f| f.name() == name);
    pandas_index_column(schema)
        .and_then(|name| position(&name))
        .or_else(|| position(INDEX_COLUMN))
        .unwrap_or(0)
}

/// Convert record batches sharing `schema` into a [`Table`].
///
/// The identifier column is the pandas index column when the schema records
/// one, then [`INDEX_COLUMN`], otherwise the first column.
pub fn table_from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Table, TableError> {
    if schema.fields().is_empty() {
        return Err(TableError::NoColumns);
    }
    let id_idx = index_position(schema);

    let columns: Vec<String> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != id_idx)
        .map(|(_, f)| f.name().clone())
        .collect();
    let mut table = Table::new(schema.field(id_idx).name().clone(), columns);

    let mut row_number = 0;
    for batch in batches {
        for row_idx in 0..batch.num_rows() {
            row_number += 1;
            let mut id = None;
            let mut values = Vec::with_capacity(batch.num_columns().saturating_sub(1));
            for col_idx in 0..batch.num_columns() {
                let field = schema.field(col_idx);
                let value = extract_value(batch.column(col_idx), row_idx, field.data_type())?;
                if col_idx == id_idx {
                    id = Some(value);
                } else {
                    values.push(value);
                }
            }
            let id = match id {
                Some(Value::Null) | None => return Err(TableError::MissingId(row_number)),
                Some(v) => v.to_string(),
            };
            table.push_row(id, values)?;
        }
    }

    Ok(table)
}

/// Convert a [`Table`] into a single record batch, identifier column first.
pub fn table_to_batch(table: &Table) -> Result<RecordBatch, TableError> {
    let mut fields = vec![Field::new(table.index_name(), DataType::Utf8, false)];
    let ids: Vec<Option<&str>> = table.sample_ids().map(Some).collect();
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(ids))];

    for (col_idx, name) in table.columns().iter().enumerate() {
        let data_type = infer_type(table, col_idx);
        columns.push(build_array(table, col_idx, &data_type));
        fields.push(Field::new(name, data_type, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(TableError::from)
}

/// Extract a value from an Arrow array at a specific row index
fn extract_value(array: &ArrayRef, row_idx: usize, data_type: &DataType) -> Result<Value, TableError> {
    if !array.is_valid(row_idx) {
        return Ok(Value::Null);
    }

    let value = match data_type {
        DataType::Utf8 => array
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| Value::String(a.value(row_idx).to_string())),
        DataType::Float64 => array
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| Value::Float64(a.value(row_idx))),
        DataType::Int64 => array
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| Value::Int64(a.value(row_idx))),
        DataType::Boolean => array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::Bool(a.value(row_idx))),
        _ => None,
    };

    match value {
        Some(v) => Ok(v),
        // Remaining types keep their display form.
        None => Ok(Value::String(array_value_to_string(array, row_idx)?)),
    }
}

fn infer_type(table: &Table, col_idx: usize) -> DataType {
    let mut inferred: Option<DataType> = None;
    for row in table.rows() {
        let data_type = match &row.values[col_idx] {
            Value::Null => continue,
            Value::String(_) => DataType::Utf8,
            Value::Float64(_) => DataType::Float64,
            Value::Int64(_) => DataType::Int64,
            Value::Bool(_) => DataType::Boolean,
        };
        match &inferred {
            None => inferred = Some(data_type),
            Some(existing) if *existing == data_type => {}
            Some(_) => return DataType::Utf8,
        }
    }
    inferred.unwrap_or(DataType::Utf8)
}

/// Build an Arrow array for one column; mixed columns were inferred as Utf8.
fn build_array(table: &Table, col_idx: usize, data_type: &DataType) -> ArrayRef {
    let cells = table.rows().iter().map(|r| &r.values[col_idx]);
    match data_type {
        DataType::Float64 => Arc::new(Float64Array::from_iter(cells.map(|v| match v {
            Value::Float64(f) => Some(*f),
            _ => None,
        }))),
        DataType::Int64 => Arc::new(Int64Array::from_iter(cells.map(|v| match v {
            Value::Int64(i) => Some(*i),
            _ => None,
        }))),
        DataType::Boolean => Arc::new(BooleanArray::from_iter(cells.map(|v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        }))),
        _ => Arc::new(StringArray::from_iter(cells.map(|v| match v {
            Value::Null => None,
            other => Some(other.to_string()),
        }))),
    }
}
