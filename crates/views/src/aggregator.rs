//! Global least-K over per-name aggregated candidates.

use std::collections::BTreeMap;

use lk_core::{Candidate, Count, Record};
use tracing::debug;

use crate::bounded::BoundedSummary;

/// Sums each group of candidate counts and keeps the K smallest totals.
///
/// Totals saturate at the `i64` bounds instead of wrapping.
#[derive(Debug)]
pub struct GlobalAggregator {
    summary: BoundedSummary,
    groups: u64,
    evictions: u64,
}

impl GlobalAggregator {
    pub fn new(k: usize) -> Self {
        Self {
            summary: BoundedSummary::new(k),
            groups: 0,
            evictions: 0,
        }
    }

    pub fn groups(&self) -> u64 {
        self.groups
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Fold one group, returning the aggregate count inserted for `name`.
    pub fn aggregate<I>(&mut self, name: &str, counts: I) -> Count
    where
        I: IntoIterator<Item = Count>,
    {
        let total = counts.into_iter().fold(0, Count::saturating_add);
        self.groups += 1;
        if self.summary.insert(total, name).is_some() {
            self.evictions += 1;
        }
        total
    }

    /// End of input: the final candidates in ascending count order.
    pub fn finish(self) -> impl Iterator<Item = Candidate> {
        debug!(
            groups = self.groups,
            evictions = self.evictions,
            retained = self.summary.len(),
            "aggregation drained"
        );
        self.summary.into_sorted_vec().into_iter()
    }
}

/// In-memory grouping boundary: gather intermediate records by name.
pub fn group_by_name<I>(records: I) -> BTreeMap<String, Vec<Count>>
where
    I: IntoIterator<Item = Record>,
{
    let mut groups: BTreeMap<String, Vec<Count>> = BTreeMap::new();
    for Record { name, count } in records {
        groups.entry(name).or_default().push(count);
    }
    groups
}
