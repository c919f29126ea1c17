//! Size-capped ordered summary retaining the K smallest candidates.

use std::collections::BTreeMap;

use lk_core::{Candidate, Count};

/// Sorted multiset of at most `capacity` candidates.
///
/// Candidates are ordered by `(count, name)`. When an insertion pushes the
/// summary past capacity, the greatest candidate under that order is evicted,
/// so among tied maximal counts the lexicographically greatest name goes first.
/// Identical `(count, name)` pairs are kept as separate entries.
#[derive(Debug, Clone)]
pub struct BoundedSummary {
    capacity: usize,
    len: usize,
    entries: BTreeMap<Candidate, usize>,
}

impl BoundedSummary {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            len: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest retained candidate, i.e. the next one to be evicted.
    pub fn max(&self) -> Option<&Candidate> {
        self.entries.keys().next_back()
    }

    /// Add `(count, name)`, returning the candidate evicted to stay within
    /// capacity, if any. The evicted candidate may be the one just offered.
    pub fn insert(&mut self, count: Count, name: impl Into<String>) -> Option<Candidate> {
        let candidate = Candidate::new(count, name);
        if self.len == self.capacity {
            match self.max() {
                Some(max) if candidate < *max => {}
                _ => return Some(candidate),
            }
        }
        *self.entries.entry(candidate).or_insert(0) += 1;
        self.len += 1;
        if self.len > self.capacity {
            self.evict_max()
        } else {
            None
        }
    }

    fn evict_max(&mut self) -> Option<Candidate> {
        let mut last = self.entries.last_entry()?;
        self.len -= 1;
        if *last.get() > 1 {
            *last.get_mut() -= 1;
            Some(last.key().clone())
        } else {
            Some(last.remove_entry().0)
        }
    }

    /// Retained candidates in ascending order. Does not mutate the summary and
    /// may be called any number of times.
    pub fn entries(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.entries
            .iter()
            .flat_map(|(candidate, copies)| std::iter::repeat(candidate).take(*copies))
    }

    /// Consume the summary, yielding owned candidates in ascending order.
    pub fn into_sorted_vec(self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(self.len);
        for (candidate, copies) in self.entries {
            for _ in 1..copies {
                out.push(candidate.clone());
            }
            out.push(candidate);
        }
        out
    }
}
