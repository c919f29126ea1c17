//! Two-stage least-K expressed as a differential dataflow.

use differential_dataflow::lattice::Lattice;
use differential_dataflow::operators::reduce::Reduce;
use differential_dataflow::Collection;
use lk_core::{Candidate, Count};
use serde::{Deserialize, Serialize};
use timely::dataflow::Scope;

use crate::aggregator::GlobalAggregator;
use crate::SelectionConfig;

/// Final ranking produced by the aggregation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ranking {
    /// Distinct names folded by the aggregator.
    pub groups: u64,
    pub evictions: u64,
    /// At most K candidates, ascending.
    pub candidates: Vec<Candidate>,
}

/// Reduce per-partition candidates `(name, count)` to the final ranking.
///
/// The first `reduce` is the grouping boundary: all counts contributed for one
/// name are gathered, with repeated `(name, count)` pairs expanded by their
/// multiplicity. Groups are then routed to a single unit key where one
/// [`GlobalAggregator`] folds them. The output holds a single [`Ranking`], or
/// nothing when no candidate was offered.
pub fn least_k<G>(
    candidates: &Collection<G, (String, Count), isize>,
    cfg: &SelectionConfig,
) -> Collection<G, Ranking, isize>
where
    G: Scope,
    G::Timestamp: Lattice + Ord,
{
    let k = cfg.k;

    let groups = candidates.reduce(|_name, inputs, output| {
        let mut counts: Vec<Count> = Vec::with_capacity(inputs.len());
        for (count, copies) in inputs.iter() {
            let copies = usize::try_from(*copies).unwrap_or(0);
            counts.extend(std::iter::repeat(**count).take(copies));
        }
        output.push((counts, 1isize));
    });

    groups
        .map(|(name, counts)| ((), (name, counts)))
        .reduce(move |_unit, inputs, output| {
            let mut aggregator = GlobalAggregator::new(k);
            for (group, _) in inputs.iter() {
                let (name, counts) = *group;
                aggregator.aggregate(name, counts.iter().copied());
            }
            let ranking = Ranking {
                groups: aggregator.groups(),
                evictions: aggregator.evictions(),
                candidates: aggregator.finish().collect(),
            };
            output.push((ranking, 1isize));
        })
        .map(|((), ranked)| ranked)
}
