use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SplitError};

pub const DEFAULT_PREFIX: &str = "partition";

/// Raw run parameters as they arrive from the command line or a YAML file.
///
/// Every field is optional so that two sources can be layered with
/// [`SplitParams::merge_over`] before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitParams {
    pub profile: Option<PathBuf>,
    pub partition_file: Option<PathBuf>,
    pub partition_column: Option<String>,
    pub partition_size: Option<usize>,
    pub outdir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub mapping_file: Option<PathBuf>,
    pub file_type: Option<OutputFormat>,
    pub force: Option<bool>,
    pub naming: Option<FileNaming>,
    pub chunk_remainder: Option<RemainderPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// How group output files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileNaming {
    /// `{prefix}-{group_id}.{format}`
    Prefixed,
    /// `{group_id}.{format}`
    Group,
}

/// What happens to a trailing chunk shorter than the chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    Keep,
    Drop,
}

/// The single partitioning strategy selected for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionSpec {
    ByFile(PathBuf),
    ByColumn(String),
    ByChunkSize {
        size: usize,
        remainder: RemainderPolicy,
    },
}

impl PartitionSpec {
    /// Build the spec from the three mutually exclusive options.
    pub fn from_options(
        file: Option<PathBuf>,
        column: Option<String>,
        size: Option<usize>,
        remainder: RemainderPolicy,
    ) -> Result<Self> {
        match (file, column, size) {
            (Some(path), None, None) => Ok(PartitionSpec::ByFile(path)),
            (None, Some(name), None) => Ok(PartitionSpec::ByColumn(name)),
            (None, None, Some(0)) => Err(SplitError::Configuration(
                "partition_size must be a positive integer".to_string(),
            )),
            (None, None, Some(size)) => Ok(PartitionSpec::ByChunkSize { size, remainder }),
            (file, column, size) => Err(SplitError::Configuration(format!(
                "ambiguous partition specification: select exactly one of partition_file, \
                 partition_column, partition_size (got partition_file: {:?}, \
                 partition_column: {:?}, partition_size: {:?})",
                file, column, size
            ))),
        }
    }
}

/// Validated configuration for one split run.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub profile: PathBuf,
    pub outdir: PathBuf,
    pub partition: PartitionSpec,
    pub prefix: String,
    pub mapping_file: Option<PathBuf>,
    pub file_type: OutputFormat,
    pub force: bool,
    pub naming: FileNaming,
    /// Parameters with defaults filled in, echoed into the run manifest.
    pub params: SplitParams,
}

impl SplitParams {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            SplitError::Configuration(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            SplitError::Configuration(format!("failed to parse YAML configuration: {}", e))
        })
    }

    /// Layer `self` on top of `base`; values set in `self` win.
    pub fn merge_over(self, base: SplitParams) -> SplitParams {
        SplitParams {
            profile: self.profile.or(base.profile),
            partition_file: self.partition_file.or(base.partition_file),
            partition_column: self.partition_column.or(base.partition_column),
            partition_size: self.partition_size.or(base.partition_size),
            outdir: self.outdir.or(base.outdir),
            prefix: self.prefix.or(base.prefix),
            mapping_file: self.mapping_file.or(base.mapping_file),
            file_type: self.file_type.or(base.file_type),
            force: self.force.or(base.force),
            naming: self.naming.or(base.naming),
            chunk_remainder: self.chunk_remainder.or(base.chunk_remainder),
        }
    }

    pub fn validate(self) -> Result<SplitConfig> {
        let profile = self.profile.clone().ok_or_else(|| {
            SplitError::Configuration("an input profile is required".to_string())
        })?;
        let outdir = self.outdir.clone().ok_or_else(|| {
            SplitError::Configuration("an output directory is required".to_string())
        })?;

        let remainder = self.chunk_remainder.unwrap_or(RemainderPolicy::Keep);
        let partition = PartitionSpec::from_options(
            self.partition_file.clone(),
            self.partition_column.clone(),
            self.partition_size,
            remainder,
        )?;

        let prefix = self
            .prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        let file_type = self.file_type.unwrap_or(OutputFormat::Text);
        let force = self.force.unwrap_or(false);
        let naming = self.naming.unwrap_or(FileNaming::Prefixed);

        let params = SplitParams {
            prefix: Some(prefix.clone()),
            file_type: Some(file_type),
            force: Some(force),
            naming: Some(naming),
            chunk_remainder: Some(remainder),
            ..self
        };

        Ok(SplitConfig {
            profile,
            outdir,
            partition,
            prefix,
            mapping_file: params.mapping_file.clone(),
            file_type,
            force,
            naming,
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SplitParams {
        SplitParams {
            profile: Some(PathBuf::from("profile.tsv")),
            outdir: Some(PathBuf::from("out")),
            ..Default::default()
        }
    }

    #[test]
    fn single_strategy_builds_matching_spec() {
        let config = SplitParams {
            partition_column: Some("site".to_string()),
            ..base()
        }
        .validate()
        .unwrap();
        assert_eq!(config.partition, PartitionSpec::ByColumn("site".to_string()));
        assert_eq!(config.prefix, "partition");
        assert_eq!(config.file_type, OutputFormat::Text);
        assert_eq!(config.naming, FileNaming::Prefixed);
        assert!(!config.force);
    }

    #[test]
    fn no_strategy_is_a_configuration_error() {
        let err = base().validate().unwrap_err();
        assert!(matches!(err, SplitError::Configuration(_)));
    }

    #[test]
    fn two_strategies_are_a_configuration_error() {
        let err = SplitParams {
            partition_column: Some("site".to_string()),
            partition_size: Some(3),
            ..base()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SplitError::Configuration(msg) if msg.contains("ambiguous")));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = PartitionSpec::from_options(None, None, Some(0), RemainderPolicy::Keep)
            .unwrap_err();
        assert!(matches!(err, SplitError::Configuration(_)));
    }

    #[test]
    fn missing_outdir_is_rejected() {
        let params = SplitParams {
            outdir: None,
            partition_size: Some(2),
            ..base()
        };
        assert!(matches!(
            params.validate(),
            Err(SplitError::Configuration(_))
        ));
    }

    #[test]
    fn yaml_values_are_overridden_by_cli() {
        let yaml = SplitParams::from_yaml_str(
            "profile: from_yaml.tsv\noutdir: out\npartition_size: 10\nfile_type: parquet\nchunk_remainder: drop\n",
        )
        .unwrap();
        let cli = SplitParams {
            profile: Some(PathBuf::from("from_cli.tsv")),
            ..Default::default()
        };
        let config = cli.merge_over(yaml).validate().unwrap();
        assert_eq!(config.profile, PathBuf::from("from_cli.tsv"));
        assert_eq!(config.file_type, OutputFormat::Parquet);
        assert_eq!(
            config.partition,
            PartitionSpec::ByChunkSize {
                size: 10,
                remainder: RemainderPolicy::Drop
            }
        );
    }

    #[test]
    fn echoed_params_carry_defaults() {
        let config = SplitParams {
            partition_size: Some(4),
            ..base()
        }
        .validate()
        .unwrap();
        assert_eq!(config.params.prefix.as_deref(), Some("partition"));
        assert_eq!(config.params.force, Some(false));
        assert_eq!(config.params.chunk_remainder, Some(RemainderPolicy::Keep));
    }
}
