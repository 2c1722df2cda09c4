use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{FileNaming, OutputFormat, SplitConfig, SplitParams};
use crate::error::{Result, SplitError};
use crate::io;
use crate::partition::{self, GroupBins};
use crate::table::Table;

mod manifest;
pub use manifest::RunManifest;

pub const RUN_FILE: &str = "run.json";
pub const ALLELE_MAP_FILE: &str = "allele_map.json";

/// Validate raw parameters and run the split.
pub fn run(params: SplitParams) -> Result<RunManifest> {
    let config = params.validate()?;
    run_split(&config)
}

/// Load the profile, resolve partitions, and write one file per group.
///
/// Every validation step runs before the output directory is touched.
pub fn run_split(config: &SplitConfig) -> Result<RunManifest> {
    let mut manifest = RunManifest::new(config.params.clone());

    check_outdir(&config.outdir, config.force)?;
    io::ensure_file_ok(&config.profile)?;

    println!("Reading profile: {}", config.profile.display());
    let mut table = io::load_table(&config.profile, io::guess_format(&config.profile))?;
    println!("  Read {} samples", table.len());
    manifest.set_profile(table.len(), &config.profile);

    let allele_map = match &config.mapping_file {
        Some(path) => io::load_allele_map(path)?,
        None => JsonValue::Object(Map::new()),
    };

    let mapping = partition::resolve(&mut table, &config.partition)?;
    let bins = GroupBins::build(&mapping);
    check_group_ids(&bins)?;

    prepare_outdir(&config.outdir)?;

    println!("Writing allele map");
    io::write_json(&allele_map, &config.outdir.join(ALLELE_MAP_FILE))?;

    for path in write_groups(&table, &bins, config)? {
        manifest.add_result_file(&path);
    }
    println!("✓ Wrote {} partition files", bins.len());

    manifest.set_memberships(bins);
    manifest.finish();

    let manifest_path = config.outdir.join(RUN_FILE);
    manifest.write_to_file(&manifest_path)?;
    println!("✓ Manifest written to: {}", manifest_path.display());

    Ok(manifest)
}

/// Output file path for one group.
pub fn group_file_path(
    outdir: &Path,
    prefix: &str,
    group_id: &str,
    naming: FileNaming,
    format: OutputFormat,
) -> PathBuf {
    let name = match naming {
        FileNaming::Prefixed => format!("{}-{}.{}", prefix, group_id, format.extension()),
        FileNaming::Group => format!("{}.{}", group_id, format.extension()),
    };
    outdir.join(name)
}

fn check_outdir(outdir: &Path, force: bool) -> Result<()> {
    if !outdir.exists() {
        return Ok(());
    }
    if !outdir.is_dir() {
        return Err(SplitError::output(
            outdir.display(),
            "path exists and is not a directory",
        ));
    }
    if !force {
        return Err(SplitError::output(
            outdir.display(),
            "folder already exists, please choose new directory or use --force",
        ));
    }
    Ok(())
}

/// Group ids become file names, so they must be non-empty and may not name
/// other directories.
fn check_group_ids(bins: &GroupBins) -> Result<()> {
    for (group_id, _) in bins.iter() {
        if group_id.is_empty()
            || group_id == "."
            || group_id == ".."
            || group_id.contains(|c: char| c == '/' || c == '\\')
        {
            return Err(SplitError::Validation(format!(
                "group id '{}' cannot be used as a file name",
                group_id
            )));
        }
    }
    Ok(())
}

fn prepare_outdir(outdir: &Path) -> Result<()> {
    if outdir.is_dir() {
        println!(
            "folder {} already exists, and force specified, cleaning up directory",
            outdir.display()
        );
        for name in [RUN_FILE, ALLELE_MAP_FILE] {
            let stale = outdir.join(name);
            if stale.is_file() {
                fs::remove_file(&stale).map_err(|e| SplitError::output(stale.display(), e))?;
            }
        }
        return Ok(());
    }
    fs::create_dir_all(outdir).map_err(|e| SplitError::output(outdir.display(), e))
}

fn write_groups(table: &Table, bins: &GroupBins, config: &SplitConfig) -> Result<Vec<PathBuf>> {
    let pb = ProgressBar::new(bins.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} groups ({percent}%)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut out_files = Vec::with_capacity(bins.len());
    for (group_id, members) in bins.iter() {
        let path = group_file_path(
            &config.outdir,
            &config.prefix,
            group_id,
            config.naming,
            config.file_type,
        );
        io::write_table(&table.select(members), &path, config.file_type)?;
        out_files.push(path);
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(out_files)
}
