//! Core types and error taxonomy for least-K selection.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod record;

pub use record::{parse_line, parse_line_bytes, parse_ranked_line, RecordError};

/// Metric by which entities are ranked; smaller ranks first.
pub type Count = i64;
pub type PartitionId = usize;

/// One raw `(entity-name, count)` pair, as read from an input line or emitted
/// by a partition selector for the grouping boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Record {
    pub name: String,
    pub count: Count,
}

impl Record {
    pub fn new(name: impl Into<String>, count: Count) -> Self {
        Self { name: name.into(), count }
    }
}

/// Intermediate form: `<name>\t<count>`.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.count)
    }
}

/// An entry held by a bounded summary.
///
/// Field order matters: the derived ordering is `(count, name)`, which is the
/// total order summaries rank and evict by.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Candidate {
    pub count: Count,
    pub name: String,
}

impl Candidate {
    pub fn new(count: Count, name: impl Into<String>) -> Self {
        Self { count, name: name.into() }
    }

    pub fn into_record(self) -> Record {
        Record { name: self.name, count: self.count }
    }
}

impl From<Record> for Candidate {
    fn from(record: Record) -> Self {
        Self { count: record.count, name: record.name }
    }
}

/// Final output form: `<count>\t<name>`.
impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.count, self.name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("malformed record in partition {partition} at line {line}: {source}")]
    MalformedRecord {
        partition: PartitionId,
        line: usize,
        #[source]
        source: RecordError,
    },
}
