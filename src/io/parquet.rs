use arrow::record_batch::RecordBatch;
use parquet::arrow::{ArrowReader, ArrowWriter, ParquetFileArrowReader};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::SerializedFileReader;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, SplitError};
use crate::table::{table_from_batches, table_to_batch, Table};

const BATCH_SIZE: usize = 64 * 1024;

pub fn read_table(path: &Path) -> Result<Table> {
    let load_err = |e: &dyn std::fmt::Display| SplitError::load(path.display(), e);

    let file = File::open(path).map_err(|e| load_err(&e))?;
    let file_reader = Arc::new(SerializedFileReader::new(file).map_err(|e| load_err(&e))?);
    let mut arrow_reader = ParquetFileArrowReader::new(file_reader);

    let schema = arrow_reader.get_schema().map_err(|e| load_err(&e))?;
    let reader_iter = arrow_reader
        .get_record_reader(BATCH_SIZE)
        .map_err(|e| load_err(&e))?;

    let batches = reader_iter
        .collect::<std::result::Result<Vec<RecordBatch>, _>>()
        .map_err(|e| load_err(&e))?;

    table_from_batches(&schema, &batches).map_err(|e| load_err(&e))
}

pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let out_err = |e: &dyn std::fmt::Display| SplitError::output(path.display(), e);

    let batch = table_to_batch(table).map_err(|e| out_err(&e))?;
    let file = File::create(path).map_err(|e| out_err(&e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::GZIP)
        // The parquet 15 dictionary hasher reads unaligned slices.
        .set_dictionary_enabled(false)
        .build();
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(|e| out_err(&e))?;

    writer.write(&batch).map_err(|e| out_err(&e))?;
    writer.close().map_err(|e| out_err(&e))?;
    Ok(())
}
