//! Final sink: one part file plus a success marker inside an output directory.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lk_core::{parse_ranked_line, Candidate, CoreError};

use crate::JobError;

pub const PART_FILE: &str = "part-r-00000";
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Jobs never overwrite earlier results.
pub fn ensure_absent(dir: &Path) -> Result<(), JobError> {
    if dir.exists() {
        return Err(JobError::OutputExists(dir.to_path_buf()));
    }
    Ok(())
}

/// Write `<count>\t<name>` lines in the given order. Returns the part file path.
pub fn write_output(dir: &Path, results: &[Candidate]) -> Result<PathBuf, JobError> {
    ensure_absent(dir)?;
    fs::create_dir_all(dir).map_err(|e| JobError::io(dir, e))?;

    let part = dir.join(PART_FILE);
    let file = File::create(&part).map_err(|e| JobError::io(&part, e))?;
    let mut writer = BufWriter::new(file);
    for candidate in results {
        writeln!(writer, "{candidate}").map_err(|e| JobError::io(&part, e))?;
    }
    writer.flush().map_err(|e| JobError::io(&part, e))?;

    let marker = dir.join(SUCCESS_MARKER);
    File::create(&marker).map_err(|e| JobError::io(&marker, e))?;
    Ok(part)
}

pub fn read_output(dir: &Path) -> Result<Vec<Candidate>, JobError> {
    let part = dir.join(PART_FILE);
    let file = File::open(&part).map_err(|e| JobError::io(&part, e))?;
    let mut results = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| JobError::io(&part, e))?;
        let candidate = parse_ranked_line(&line).map_err(|source| JobError::Malformed {
            path: part.clone(),
            source: CoreError::MalformedRecord { partition: 0, line: idx + 1, source },
        })?;
        results.push(candidate);
    }
    Ok(results)
}
