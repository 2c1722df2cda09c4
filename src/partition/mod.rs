use std::collections::HashMap;
use std::path::Path;

use crate::config::{PartitionSpec, RemainderPolicy};
use crate::error::{Result, SplitError};
use crate::io;
use crate::table::Table;

mod bins;

pub use bins::GroupBins;

/// Group id assigned to every row when one chunk covers the whole table.
pub const SINGLE_CHUNK_GROUP: &str = "0";

/// `sample_id -> group_id`, kept in the profile's row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionMapping {
    entries: Vec<(String, String)>,
}

impl PartitionMapping {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(s, g)| (s.as_str(), g.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn group_of(&self, sample_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == sample_id)
            .map(|(_, g)| g.as_str())
    }
}

impl FromIterator<(String, String)> for PartitionMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Resolve a partition spec against the loaded profile.
///
/// `ByColumn` removes the partition column from `table` so that written rows
/// never carry it. `ByFile` loads and checks the membership file.
pub fn resolve(table: &mut Table, spec: &PartitionSpec) -> Result<PartitionMapping> {
    match spec {
        PartitionSpec::ByColumn(name) => {
            println!("Processing partition column {}", name);
            resolve_column(table, name)
        }
        PartitionSpec::ByFile(path) => {
            println!("Processing partition file {}", path.display());
            io::ensure_file_ok(path)?;
            let memberships = io::load_memberships(path)?;
            resolve_memberships(table, &memberships, path)
        }
        PartitionSpec::ByChunkSize { size, remainder } => {
            println!("Splitting input file into bins of size {}", size);
            resolve_chunks(table, *size, *remainder)
        }
    }
}

fn resolve_column(table: &mut Table, name: &str) -> Result<PartitionMapping> {
    let mapping: PartitionMapping = table
        .column_values(name)
        .ok_or_else(|| {
            SplitError::Validation(format!(
                "profile does not contain the partition column '{}'",
                name
            ))
        })?
        .map(|(id, value)| (id.to_string(), value.as_group_id()))
        .collect();

    table.drop_column(name);
    Ok(mapping)
}

/// Keep only profile samples listed in the membership table, in profile order.
fn resolve_memberships(
    table: &Table,
    memberships: &Table,
    source: &Path,
) -> Result<PartitionMapping> {
    let group_column = memberships.columns().first().ok_or_else(|| {
        SplitError::load(source.display(), "membership file has no partition column")
    })?;
    let groups: HashMap<&str, String> = memberships
        .column_values(group_column)
        .into_iter()
        .flatten()
        .map(|(id, value)| (id, value.as_group_id()))
        .collect();

    let mapping: PartitionMapping = table
        .sample_ids()
        .filter_map(|id| groups.get(id).map(|g| (id.to_string(), g.clone())))
        .collect();

    if mapping.is_empty() {
        let mut profile_ids: Vec<&str> = table.sample_ids().collect();
        let mut partition_ids: Vec<&str> = memberships.sample_ids().collect();
        profile_ids.sort_unstable();
        partition_ids.sort_unstable();
        return Err(SplitError::Validation(format!(
            "no overlapping sample identifiers between {} and the profile \
             (profile samples: {:?}; partition samples: {:?})",
            source.display(),
            profile_ids,
            partition_ids
        )));
    }

    let excluded = table.len() - mapping.len();
    if excluded > 0 {
        println!(
            "  {} profile samples are not listed in {} and will be excluded",
            excluded,
            source.display()
        );
    }
    Ok(mapping)
}

/// Consecutive chunks of `size` rows in table order, labelled by chunk index.
fn resolve_chunks(
    table: &Table,
    size: usize,
    remainder: RemainderPolicy,
) -> Result<PartitionMapping> {
    if size == 0 {
        return Err(SplitError::Configuration(
            "partition_size must be a positive integer".to_string(),
        ));
    }

    let rows = table.len();
    if size >= rows {
        return Ok(table
            .sample_ids()
            .map(|id| (id.to_string(), SINGLE_CHUNK_GROUP.to_string()))
            .collect());
    }

    let full_chunks = rows / size;
    let has_partial = rows % size != 0;
    if has_partial && remainder == RemainderPolicy::Drop {
        println!("  Dropping {} trailing rows", rows % size);
    }

    Ok(table
        .sample_ids()
        .enumerate()
        .map(|(i, id)| (id, i / size))
        .filter(|(_, chunk)| {
            !(has_partial && remainder == RemainderPolicy::Drop && *chunk == full_chunks)
        })
        .map(|(id, chunk)| (id.to_string(), chunk.to_string()))
        .collect())
}
