//! Sequential composition of both stages, without a dataflow runtime.

use lk_core::{Candidate, CoreError};

use crate::aggregator::{group_by_name, GlobalAggregator};
use crate::selector::PartitionSelector;
use crate::SelectionConfig;

/// Run every partition through its own selector, group the emitted records by
/// name, and aggregate. Matches what [`crate::least_k`] computes.
pub fn select_least_k<P, I, S>(
    partitions: P,
    cfg: &SelectionConfig,
) -> Result<Vec<Candidate>, CoreError>
where
    P: IntoIterator<Item = I>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut emitted = Vec::new();
    for (id, lines) in partitions.into_iter().enumerate() {
        emitted.extend(PartitionSelector::select(id, cfg.k, lines)?);
    }

    let mut aggregator = GlobalAggregator::new(cfg.k);
    for (name, counts) in group_by_name(emitted) {
        aggregator.aggregate(&name, counts);
    }
    Ok(aggregator.finish().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_partition_reference_run() {
        let out = select_least_k(
            [["A\t10", "B\t3", "C\t7", "D\t3", "E\t20", "F\t1"]],
            &SelectionConfig::default(),
        )
        .unwrap();
        let lines: Vec<String> = out.iter().map(ToString::to_string).collect();
        assert_eq!(lines, ["1\tF", "3\tB", "3\tD", "7\tC", "10\tA"]);
    }

    #[test]
    fn counts_for_a_name_are_summed_across_partitions() {
        let out = select_least_k(
            vec![vec!["x\t1", "y\t5"], vec!["x\t2", "z\t4"]],
            &SelectionConfig { k: 2 },
        )
        .unwrap();
        assert_eq!(out, vec![Candidate::new(3, "x"), Candidate::new(4, "z")]);
    }

    #[test]
    fn zero_k_yields_nothing() {
        let out = select_least_k([["a\t1", "b\t2"]], &SelectionConfig { k: 0 }).unwrap();
        assert!(out.is_empty());
    }
}
