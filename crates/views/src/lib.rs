//! Bounded least-K selection: the summary, its two drivers, and the dataflow
//! view that wires them together.

use serde::{Deserialize, Serialize};

pub mod aggregator;
pub mod bounded;
pub mod dataflow;
pub mod local;
pub mod selector;

pub use aggregator::{group_by_name, GlobalAggregator};
pub use bounded::BoundedSummary;
pub use dataflow::{least_k, Ranking};
pub use local::select_least_k;
pub use selector::{PartitionSelector, SelectorStats};

pub const DEFAULT_K: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionConfig {
    pub k: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}
