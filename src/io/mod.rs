use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::OutputFormat;
use crate::error::{Result, SplitError};
use crate::table::Table;

mod json;
mod parquet;
mod text;

pub use json::{load_allele_map, write_json};

/// Smallest byte size an input file may have and still hold a header plus one row.
pub const MIN_FILE_SIZE: u64 = 32;

/// On-disk format of an input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Text,
    Parquet,
    Json,
    Hdf5,
}

impl FileFormat {
    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Text => "text",
            FileFormat::Parquet => "parquet",
            FileFormat::Json => "json",
            FileFormat::Hdf5 => "hdf5",
        }
    }
}

/// Guess a file's format from its extension; unknown extensions are read as text.
pub fn guess_format(path: &Path) -> FileFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "parq" | "parquet" | "pq" => FileFormat::Parquet,
        "json" => FileFormat::Json,
        "hd" | "h5" | "hdf5" => FileFormat::Hdf5,
        _ => FileFormat::Text,
    }
}

/// Check that a file exists, meets [`MIN_FILE_SIZE`], and for delimited text
/// holds at least a header and one data line.
pub fn is_file_ok(path: &Path) -> bool {
    let meta = match fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta,
        _ => return false,
    };
    if guess_format(path) == FileFormat::Text && count_lines(path, 2) < 2 {
        return false;
    }
    meta.len() >= MIN_FILE_SIZE
}

/// [`is_file_ok`] as a `ValidationError`.
pub fn ensure_file_ok(path: &Path) -> Result<()> {
    if is_file_ok(path) {
        Ok(())
    } else {
        Err(SplitError::Validation(format!(
            "file {} either does not exist or is too small to be valid",
            path.display()
        )))
    }
}

/// Count lines up to `limit`; unreadable files count as zero.
fn count_lines(path: &Path, limit: usize) -> usize {
    match File::open(path) {
        Ok(file) => BufReader::new(file)
            .lines()
            .take(limit)
            .take_while(|line| line.is_ok())
            .count(),
        Err(_) => 0,
    }
}

/// Load a profile table in the given format.
pub fn load_table(path: &Path, format: FileFormat) -> Result<Table> {
    match format {
        FileFormat::Text => text::read_table(path),
        FileFormat::Parquet => parquet::read_table(path),
        other => Err(SplitError::load(
            path.display(),
            format!("{} is not a supported profile format", other.name()),
        )),
    }
}

/// Load a membership file: a table whose first column is the group id, or a
/// JSON object of sample id to group id.
pub fn load_memberships(path: &Path) -> Result<Table> {
    let table = match guess_format(path) {
        FileFormat::Json => json::read_memberships(path)?,
        format => load_table(path, format)?,
    };
    if table.columns().is_empty() {
        return Err(SplitError::load(
            path.display(),
            "membership file needs a sample id column and a partition column",
        ));
    }
    Ok(table)
}

/// Write a table in the configured output format.
pub fn write_table(table: &Table, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => text::write_table(table, path),
        OutputFormat::Parquet => parquet::write_table(table, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn guesses_format_from_extension() {
        assert_eq!(guess_format(Path::new("a/profile.tsv")), FileFormat::Text);
        assert_eq!(guess_format(Path::new("profile.MAT")), FileFormat::Text);
        assert_eq!(guess_format(Path::new("profile.pq")), FileFormat::Parquet);
        assert_eq!(guess_format(Path::new("groups.json")), FileFormat::Json);
        assert_eq!(guess_format(Path::new("profile.h5")), FileFormat::Hdf5);
        assert_eq!(guess_format(Path::new("profile")), FileFormat::Text);
    }

    #[test]
    fn file_checks_enforce_size_and_lines() {
        let dir = tempdir().unwrap();

        let missing = dir.path().join("missing.tsv");
        assert!(!is_file_ok(&missing));

        let header_only = dir.path().join("header.tsv");
        fs::write(&header_only, "sample_id\tlocus_one\tlocus_two\tlocus_three\n").unwrap();
        assert!(!is_file_ok(&header_only));

        let tiny = dir.path().join("tiny.tsv");
        fs::write(&tiny, "id\tl\nA\t1\n").unwrap();
        assert!(!is_file_ok(&tiny));

        let good = dir.path().join("good.tsv");
        fs::write(&good, "sample_id\tlocus_one\tlocus_two\nA\t1\t2\n").unwrap();
        assert!(is_file_ok(&good));
        assert!(ensure_file_ok(&good).is_ok());
        assert!(matches!(
            ensure_file_ok(&tiny),
            Err(SplitError::Validation(_))
        ));
    }

    #[test]
    fn single_line_json_passes_size_check() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.json");
        fs::write(&path, r#"{"A": "north", "B": "south", "C": "north"}"#).unwrap();
        assert!(is_file_ok(&path));
    }

    #[test]
    fn hdf5_profiles_are_rejected() {
        let err = load_table(Path::new("profile.h5"), FileFormat::Hdf5).unwrap_err();
        assert!(matches!(err, SplitError::Load { .. }));
    }

    #[test]
    fn membership_table_needs_group_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.tsv");
        fs::write(&path, "sample_id\nsample_one\nsample_two\n").unwrap();
        let err = load_memberships(&path).unwrap_err();
        assert!(matches!(err, SplitError::Load { .. }));
    }
}
