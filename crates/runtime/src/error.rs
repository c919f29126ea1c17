use std::io;
use std::path::PathBuf;

use lk_core::CoreError;

#[derive(thiserror::Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: CoreError,
    },
    #[error("no input paths given")]
    NoInputs,
    #[error("input path {0} does not exist")]
    InputMissing(PathBuf),
    #[error("output path {0} already exists")]
    OutputExists(PathBuf),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("timely runtime failed: {0}")]
    Runtime(String),
}

impl JobError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
