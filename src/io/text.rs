use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::path::Path;

use crate::error::{Result, SplitError};
use crate::table::{Table, TableError, Value};

/// Read a tab-separated table with a header row; the first column is the row id.
///
/// Cells are kept as raw strings; empty cells load as nulls.
pub fn read_table(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| SplitError::load(path.display(), e))?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|e| SplitError::load(path.display(), e))?
        .clone();
    let mut header_iter = headers.iter();
    let index_name = header_iter
        .next()
        .ok_or_else(|| SplitError::load(path.display(), TableError::NoColumns))?;
    let columns: Vec<String> = header_iter.map(str::to_string).collect();
    let mut table = Table::new(index_name, columns);

    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| {
            SplitError::load(path.display(), format!("parse record #{}: {}", i + 1, e))
        })?;
        let mut fields = rec.iter();
        let id = match fields.next() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(SplitError::load(path.display(), TableError::MissingId(i + 1))),
        };
        let values = fields
            .map(|f| match f {
                "" => Value::Null,
                f => Value::String(f.to_string()),
            })
            .collect();
        table
            .push_row(id, values)
            .map_err(|e| SplitError::load(path.display(), e))?;
    }

    Ok(table)
}

/// Write a table as tab-separated text, identifier column first.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| SplitError::output(path.display(), e))?;

    let header = std::iter::once(table.index_name()).chain(table.columns().iter().map(String::as_str));
    wtr.write_record(header)
        .map_err(|e| SplitError::output(path.display(), e))?;

    for row in table.rows() {
        let record = std::iter::once(row.id.clone()).chain(row.values.iter().map(Value::to_string));
        wtr.write_record(record)
            .map_err(|e| SplitError::output(path.display(), e))?;
    }

    wtr.flush()
        .map_err(|e| SplitError::output(path.display(), e))?;
    Ok(())
}
