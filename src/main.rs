use clap::Parser;
use std::path::PathBuf;

mod config;
mod error;
mod io;
mod partition;
mod runtime;
mod table;

use config::{FileNaming, OutputFormat, RemainderPolicy, SplitParams};

#[derive(Parser)]
#[command(name = "profile_splitter", version)]
#[command(
    about = "Profile Splitter: Tool for splitting allelic profiles into different groups based on defined partitions",
    long_about = None
)]
struct Cli {
    /// Allelic profiles
    #[arg(short = 'i', long)]
    profile: Option<PathBuf>,

    /// Two column membership file id,partition or json (mutually exclusive with partition_column and partition_size)
    #[arg(short = 'a', long = "partition_file")]
    partition_file: Option<PathBuf>,

    /// Column internal to allelic profile for splitting (mutually exclusive with partition_file and partition_size)
    #[arg(short = 'c', long = "partition_column")]
    partition_column: Option<String>,

    /// Split file into chunks of specified size (mutually exclusive with partition_file and partition_column)
    #[arg(short = 's', long = "partition_size")]
    partition_size: Option<usize>,

    /// Result output directory
    #[arg(short = 'o', long)]
    outdir: Option<PathBuf>,

    /// Prefix for result files [default: partition]
    #[arg(short = 'p', long)]
    prefix: Option<String>,

    /// json formatted allele mapping
    #[arg(short = 'm', long = "mapping_file")]
    mapping_file: Option<PathBuf>,

    /// Output format [default: text]
    #[arg(short = 'e', long = "file_type", value_enum)]
    file_type: Option<OutputFormat>,

    /// Overwrite existing directory
    #[arg(short = 'f', long)]
    force: bool,

    /// Output file naming [default: prefixed]
    #[arg(long, value_enum)]
    naming: Option<FileNaming>,

    /// Keep or drop a trailing chunk shorter than partition_size [default: keep]
    #[arg(long = "chunk_remainder", value_enum)]
    chunk_remainder: Option<RemainderPolicy>,

    /// YAML file with default values for any of the options above
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_params(self) -> SplitParams {
        SplitParams {
            profile: self.profile,
            partition_file: self.partition_file,
            partition_column: self.partition_column,
            partition_size: self.partition_size,
            outdir: self.outdir,
            prefix: self.prefix,
            mapping_file: self.mapping_file,
            file_type: self.file_type,
            force: self.force.then_some(true),
            naming: self.naming,
            chunk_remainder: self.chunk_remainder,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let base = match cli.config.take() {
        Some(path) => SplitParams::from_yaml_file(&path)?,
        None => SplitParams::default(),
    };
    let manifest = runtime::run(cli.into_params().merge_over(base))?;

    println!(
        "\n✓ Split {} samples into {} groups",
        manifest.profile_info.num_samples,
        manifest.batch_memberships.len()
    );
    Ok(())
}
