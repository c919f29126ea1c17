use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    records_read: AtomicU64,
    partitions_completed: AtomicU64,
    candidates_emitted: AtomicU64,
    local_evictions: AtomicU64,
    groups_aggregated: AtomicU64,
    global_evictions: AtomicU64,
    largest_partition: AtomicU64,
}

impl MetricsRegistry {
    pub fn inc_records_read(&self, delta: u64) {
        self.inner.records_read.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_partitions_completed(&self, delta: u64) {
        self.inner.partitions_completed.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_candidates_emitted(&self, delta: u64) {
        self.inner.candidates_emitted.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_local_evictions(&self, delta: u64) {
        self.inner.local_evictions.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_groups_aggregated(&self, delta: u64) {
        self.inner.groups_aggregated.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_global_evictions(&self, delta: u64) {
        self.inner.global_evictions.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn record_partition_size(&self, records: u64) {
        self.inner
            .largest_partition
            .fetch_max(records, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.inner.records_read.load(Ordering::Relaxed),
            partitions_completed: self.inner.partitions_completed.load(Ordering::Relaxed),
            candidates_emitted: self.inner.candidates_emitted.load(Ordering::Relaxed),
            local_evictions: self.inner.local_evictions.load(Ordering::Relaxed),
            groups_aggregated: self.inner.groups_aggregated.load(Ordering::Relaxed),
            global_evictions: self.inner.global_evictions.load(Ordering::Relaxed),
            largest_partition: self.inner.largest_partition.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_read: u64,
    pub partitions_completed: u64,
    pub candidates_emitted: u64,
    pub local_evictions: u64,
    pub groups_aggregated: u64,
    pub global_evictions: u64,
    pub largest_partition: u64,
}

impl MetricsSnapshot {
    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Line<'a> {
            label: &'a str,
            #[serde(flatten)]
            counters: &'a MetricsSnapshot,
            elapsed_ms: Option<u128>,
        }

        let payload = Line {
            label,
            counters: self,
            elapsed_ms: elapsed.map(|d| d.as_millis()),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = MetricsRegistry::default();
        let worker_view = metrics.clone();
        worker_view.inc_records_read(6);
        worker_view.record_partition_size(6);
        worker_view.record_partition_size(2);
        metrics.inc_partitions_completed(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_read, 6);
        assert_eq!(snapshot.largest_partition, 6);
        assert_eq!(snapshot.partitions_completed, 1);
    }

    #[test]
    fn json_line_flattens_counters() {
        let snapshot = MetricsSnapshot { groups_aggregated: 3, ..MetricsSnapshot::default() };
        let line = snapshot.to_json_line("job", Some(Duration::from_millis(12)));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["label"], "job");
        assert_eq!(value["groups_aggregated"], 3);
        assert_eq!(value["elapsed_ms"], 12);
    }
}
