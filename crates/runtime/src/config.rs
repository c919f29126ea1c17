use std::fs;
use std::path::{Path, PathBuf};

use lk_views::{SelectionConfig, DEFAULT_K};
use serde::{Deserialize, Serialize};

use crate::JobError;

/// Everything needed to run one least-K job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JobConfig {
    pub k: usize,
    pub workers: usize,
    /// Split each input file into partitions of this many lines. `None` keeps
    /// one partition per file.
    pub lines_per_partition: Option<usize>,
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            workers: 1,
            lines_per_partition: None,
            inputs: Vec::new(),
            output: None,
        }
    }
}

impl JobConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, JobError> {
        let raw = fs::read_to_string(path).map_err(|e| JobError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply positional command-line paths: the last is the output location,
    /// any before it are inputs. A lone path only sets the output, so inputs
    /// from a configuration file survive.
    pub fn apply_paths(&mut self, paths: &[PathBuf]) {
        if let Some((output, inputs)) = paths.split_last() {
            if !inputs.is_empty() {
                self.inputs = inputs.to_vec();
            }
            self.output = Some(output.clone());
        }
    }

    pub fn selection(&self) -> SelectionConfig {
        SelectionConfig { k: self.k }
    }

    pub fn validate(&self) -> Result<(), JobError> {
        if self.workers == 0 {
            return Err(JobError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.lines_per_partition == Some(0) {
            return Err(JobError::InvalidConfig(
                "lines_per_partition must be at least 1".into(),
            ));
        }
        if self.inputs.is_empty() {
            return Err(JobError::NoInputs);
        }
        Ok(())
    }
}
