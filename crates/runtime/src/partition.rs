//! Input splitting: turn input locations into independently processed partitions.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lk_core::PartitionId;
use lk_views::PartitionSelector;
use tracing::debug;

use crate::JobError;

#[derive(Debug, Clone)]
pub enum PartitionSource {
    /// A byte range of one file starting on a line boundary. `len: None` reads
    /// to the end; `first_line` is the 1-based file line number at `offset`.
    File {
        path: PathBuf,
        offset: u64,
        len: Option<u64>,
        first_line: usize,
    },
    Lines(Arc<Vec<String>>),
}

#[derive(Debug, Clone)]
pub struct PartitionSpec {
    pub id: PartitionId,
    pub source: PartitionSource,
}

impl PartitionSpec {
    /// Scan the partition into a fresh selector, ready to be drained.
    pub fn select(&self, k: usize) -> Result<PartitionSelector, JobError> {
        let mut selector = PartitionSelector::new(self.id, k);
        match &self.source {
            PartitionSource::Lines(lines) => selector.push_lines(lines.iter())?,
            PartitionSource::File { path, offset, len, first_line } => {
                let mut file = File::open(path).map_err(|e| JobError::io(path, e))?;
                file.seek(SeekFrom::Start(*offset)).map_err(|e| JobError::io(path, e))?;
                let mut reader = BufReader::new(file.take(len.unwrap_or(u64::MAX)));
                let mut buf = Vec::new();
                let mut line_no = *first_line;
                loop {
                    buf.clear();
                    let read = reader
                        .read_until(b'\n', &mut buf)
                        .map_err(|e| JobError::io(path, e))?;
                    if read == 0 {
                        break;
                    }
                    let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
                    selector
                        .push_line_bytes(line_no, line)
                        .map_err(|source| JobError::Malformed { path: path.clone(), source })?;
                    line_no += 1;
                }
            }
        }
        Ok(selector)
    }
}

/// One partition per in-memory line batch.
pub fn in_memory_partitions<I>(batches: I) -> Vec<PartitionSpec>
where
    I: IntoIterator<Item = Vec<String>>,
{
    batches
        .into_iter()
        .enumerate()
        .map(|(id, lines)| PartitionSpec {
            id,
            source: PartitionSource::Lines(Arc::new(lines)),
        })
        .collect()
}

/// Expand input paths into partitions.
///
/// Directories contribute their regular files in name order, skipping names
/// that start with `_` or `.`. Each file is one partition unless
/// `lines_per_partition` asks for fixed-size line chunks.
pub fn plan_partitions(
    inputs: &[PathBuf],
    lines_per_partition: Option<usize>,
) -> Result<Vec<PartitionSpec>, JobError> {
    if inputs.is_empty() {
        return Err(JobError::NoInputs);
    }

    let mut files = Vec::new();
    for input in inputs {
        files.extend(expand_input(input)?);
    }

    let mut partitions = Vec::new();
    for path in files {
        match lines_per_partition {
            Some(chunk) if chunk > 0 => {
                let offsets = chunk_offsets(&path, chunk)?;
                for (i, &offset) in offsets.iter().enumerate() {
                    let len = offsets.get(i + 1).map(|next| next - offset);
                    partitions.push(PartitionSpec {
                        id: partitions.len(),
                        source: PartitionSource::File {
                            path: path.clone(),
                            offset,
                            len,
                            first_line: i * chunk + 1,
                        },
                    });
                }
            }
            _ => partitions.push(PartitionSpec {
                id: partitions.len(),
                source: PartitionSource::File { path, offset: 0, len: None, first_line: 1 },
            }),
        }
    }
    debug!(partitions = partitions.len(), "input planned");
    Ok(partitions)
}

fn expand_input(input: &Path) -> Result<Vec<PathBuf>, JobError> {
    if !input.exists() {
        return Err(JobError::InputMissing(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(input).map_err(|e| JobError::io(input, e))? {
        let entry = entry.map_err(|e| JobError::io(input, e))?;
        let hidden = entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with('_') || name.starts_with('.'));
        if !hidden && entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Byte offsets at which each `chunk`-line slice of the file starts, found
/// in a single pass. An empty file still yields one (empty) slice.
fn chunk_offsets(path: &Path, chunk: usize) -> Result<Vec<u64>, JobError> {
    let file = File::open(path).map_err(|e| JobError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut offsets = vec![0];
    let mut buf = Vec::new();
    let mut pos = 0u64;
    let mut lines = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| JobError::io(path, e))?;
        if read == 0 {
            break;
        }
        pos += read as u64;
        lines += 1;
        if lines % chunk == 0 {
            offsets.push(pos);
        }
    }
    // Drop a trailing boundary that sits at end of file.
    if offsets.len() > 1 && offsets.last() == Some(&pos) {
        offsets.pop();
    }
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lk_core::{CoreError, Record, RecordError};

    #[test]
    fn in_memory_partitions_are_numbered() {
        let parts = in_memory_partitions(vec![vec!["a\t1".to_string()], Vec::new()]);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].id, 1);
        assert!(parts[1].select(5).unwrap().finish().next().is_none());
    }

    #[test]
    fn malformed_in_memory_line_is_a_core_error() {
        let parts = in_memory_partitions(vec![vec!["a\tone".to_string()]]);
        assert!(matches!(parts[0].select(5), Err(JobError::Core(_))));
    }

    fn file_ranges(parts: &[PartitionSpec]) -> Vec<(u64, Option<u64>, usize)> {
        parts
            .iter()
            .map(|p| match &p.source {
                PartitionSource::File { offset, len, first_line, .. } => {
                    (*offset, *len, *first_line)
                }
                PartitionSource::Lines(_) => panic!("expected file partition"),
            })
            .collect()
    }

    #[test]
    fn chunks_read_only_their_own_byte_range() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("views.tsv");
        fs::write(&path, "a\t1\nb\t2\nc\tbad\nd\t4\ne\t5\n").unwrap();

        let parts = plan_partitions(&[path.clone()], Some(2)).unwrap();
        assert_eq!(
            file_ranges(&parts),
            vec![(0, Some(8), 1), (8, Some(10), 3), (18, None, 5)]
        );

        // The malformed line in the middle chunk is never seen by its neighbours.
        let first: Vec<_> = parts[0].select(5).unwrap().finish().collect();
        assert_eq!(first, vec![Record::new("a", 1), Record::new("b", 2)]);
        let last: Vec<_> = parts[2].select(5).unwrap().finish().collect();
        assert_eq!(last, vec![Record::new("e", 5)]);

        match parts[1].select(5) {
            Err(JobError::Malformed {
                path: bad_path,
                source: CoreError::MalformedRecord { partition, line, .. },
            }) => {
                assert_eq!(bad_path, path);
                assert_eq!((partition, line), (1, 3));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn chunk_boundary_at_end_of_file_adds_no_empty_partition() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("even.tsv");
        fs::write(&path, "a\t1\nb\t2\nc\t3\nd\t4").unwrap();
        let parts = plan_partitions(&[path.clone()], Some(2)).unwrap();
        assert_eq!(file_ranges(&parts), vec![(0, Some(8), 1), (8, None, 3)]);
        // Last line without a terminator is still read.
        assert_eq!(parts[1].select(5).unwrap().stats().records, 2);

        let empty = tmp.path().join("empty.tsv");
        fs::write(&empty, "").unwrap();
        let parts = plan_partitions(&[empty], Some(2)).unwrap();
        assert_eq!(file_ranges(&parts), vec![(0, None, 1)]);
    }

    #[test]
    fn invalid_utf8_is_a_malformed_record_with_its_line() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("binary.tsv");
        fs::write(&path, b"ok\t1\n\xff\xfe\t2\n").unwrap();
        let parts = plan_partitions(&[path], None).unwrap();
        match parts[0].select(5) {
            Err(JobError::Malformed {
                source: CoreError::MalformedRecord { line, source, .. },
                ..
            }) => {
                assert_eq!(line, 2);
                assert!(matches!(source, RecordError::InvalidUtf8(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_input_is_reported() {
        let err = plan_partitions(&[PathBuf::from("/definitely/not/here")], None).unwrap_err();
        assert!(matches!(err, JobError::InputMissing(_)));
    }
}
