use chrono::Local;
use serde::Serialize;
use std::path::Path;

use crate::config::SplitParams;
use crate::error::Result;
use crate::io;
use crate::partition::GroupBins;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Run summary written to `run.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub profile_splitter: String,
    pub analysis_start_time: String,
    pub analysis_end_time: String,
    pub parameters: SplitParams,
    pub profile_info: ProfileInfo,
    pub batch_memberships: GroupBins,
    pub result_files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileInfo {
    pub num_samples: usize,
    pub parsed_file_path: String,
}

fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

impl RunManifest {
    pub fn new(parameters: SplitParams) -> Self {
        Self {
            profile_splitter: format!("version: {}", env!("CARGO_PKG_VERSION")),
            analysis_start_time: now(),
            analysis_end_time: String::new(),
            parameters,
            profile_info: ProfileInfo::default(),
            batch_memberships: GroupBins::default(),
            result_files: Vec::new(),
        }
    }

    pub fn set_profile(&mut self, num_samples: usize, path: &Path) {
        self.profile_info = ProfileInfo {
            num_samples,
            parsed_file_path: path.display().to_string(),
        };
    }

    pub fn set_memberships(&mut self, bins: GroupBins) {
        self.batch_memberships = bins;
    }

    pub fn add_result_file(&mut self, path: &Path) {
        self.result_files.push(path.display().to_string());
    }

    pub fn finish(&mut self) {
        self.analysis_end_time = now();
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        io::write_json(self, path.as_ref())
    }
}
