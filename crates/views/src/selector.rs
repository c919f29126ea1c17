//! Per-partition local least-K selection.

use lk_core::{parse_line, parse_line_bytes, CoreError, Count, PartitionId, Record};
use tracing::debug;

use crate::bounded::BoundedSummary;

/// Counters a selector accumulates while scanning its partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorStats {
    pub records: u64,
    pub evictions: u64,
}

/// Owns one partition's summary from the first record to the final drain.
///
/// Draining consumes the selector, so nothing can be inserted once emission
/// has started.
#[derive(Debug)]
pub struct PartitionSelector {
    partition: PartitionId,
    summary: BoundedSummary,
    stats: SelectorStats,
}

impl PartitionSelector {
    pub fn new(partition: PartitionId, k: usize) -> Self {
        Self {
            partition,
            summary: BoundedSummary::new(k),
            stats: SelectorStats::default(),
        }
    }

    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    pub fn stats(&self) -> SelectorStats {
        self.stats
    }

    /// Parse and fold one raw line. `line_no` is 1-based and only used to
    /// locate a malformed record.
    pub fn push_line(&mut self, line_no: usize, line: &str) -> Result<(), CoreError> {
        let record = parse_line(line).map_err(|source| CoreError::MalformedRecord {
            partition: self.partition,
            line: line_no,
            source,
        })?;
        self.push(record);
        Ok(())
    }

    /// Like [`push_line`](Self::push_line) for undecoded input; invalid UTF-8
    /// is reported as a malformed record at `line_no`.
    pub fn push_line_bytes(&mut self, line_no: usize, bytes: &[u8]) -> Result<(), CoreError> {
        let record = parse_line_bytes(bytes).map_err(|source| CoreError::MalformedRecord {
            partition: self.partition,
            line: line_no,
            source,
        })?;
        self.push(record);
        Ok(())
    }

    pub fn push(&mut self, record: Record) {
        self.offer(record.count, record.name);
    }

    fn offer(&mut self, count: Count, name: String) {
        self.stats.records += 1;
        if self.summary.insert(count, name).is_some() {
            self.stats.evictions += 1;
        }
    }

    /// Fold every line of the partition, stopping at the first malformed one.
    pub fn push_lines<I, S>(&mut self, lines: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (idx, line) in lines.into_iter().enumerate() {
            self.push_line(idx + 1, line.as_ref())?;
        }
        Ok(())
    }

    /// End of partition: emit every retained candidate as an intermediate record.
    pub fn finish(self) -> impl Iterator<Item = Record> {
        debug!(
            partition = self.partition,
            records = self.stats.records,
            evictions = self.stats.evictions,
            retained = self.summary.len(),
            "partition drained"
        );
        self.summary.into_sorted_vec().into_iter().map(|c| c.into_record())
    }

    /// Run a whole partition through a fresh selector.
    pub fn select<I, S>(
        partition: PartitionId,
        k: usize,
        lines: I,
    ) -> Result<Vec<Record>, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selector = Self::new(partition, k);
        selector.push_lines(lines)?;
        Ok(selector.finish().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lk_core::RecordError;

    #[test]
    fn emits_local_least_k_as_records() {
        let lines = ["A\t10", "B\t3", "C\t7", "D\t3", "E\t20", "F\t1"];
        let mut selector = PartitionSelector::new(0, 5);
        selector.push_lines(lines).unwrap();
        assert_eq!(selector.stats(), SelectorStats { records: 6, evictions: 1 });

        let emitted: Vec<_> = selector.finish().collect();
        assert_eq!(
            emitted,
            vec![
                Record::new("F", 1),
                Record::new("B", 3),
                Record::new("D", 3),
                Record::new("C", 7),
                Record::new("A", 10),
            ]
        );
    }

    #[test]
    fn malformed_line_fails_the_partition() {
        let err = PartitionSelector::select(3, 5, ["ok\t1", "broken", "later\t2"]).unwrap_err();
        match err {
            CoreError::MalformedRecord { partition, line, source } => {
                assert_eq!(partition, 3);
                assert_eq!(line, 2);
                assert_eq!(source, RecordError::FieldCount(1));
            }
        }
    }

    #[test]
    fn undecodable_bytes_carry_their_line_number() {
        let mut selector = PartitionSelector::new(4, 5);
        selector.push_line_bytes(1, b"fine\t3").unwrap();
        let err = selector.push_line_bytes(2, b"\xff\t2").unwrap_err();
        match err {
            CoreError::MalformedRecord { partition, line, source } => {
                assert_eq!((partition, line), (4, 2));
                assert!(matches!(source, RecordError::InvalidUtf8(_)));
            }
        }
        assert_eq!(selector.stats().records, 1);
    }

    #[test]
    fn empty_partition_emits_nothing() {
        let emitted = PartitionSelector::select(0, 5, Vec::<String>::new()).unwrap();
        assert!(emitted.is_empty());
    }

    #[test]
    fn repeated_names_are_not_merged_locally() {
        let emitted = PartitionSelector::select(0, 3, ["x\t4", "x\t2", "y\t9"]).unwrap();
        assert_eq!(
            emitted,
            vec![Record::new("x", 2), Record::new("x", 4), Record::new("y", 9)]
        );
    }
}
