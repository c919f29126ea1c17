//! Job execution: map every partition through a selector on the timely
//! workers, shuffle candidates by name, and aggregate on a single key.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use differential_dataflow::input::InputSession;
use lk_core::{Candidate, Count, Record};
use lk_views::{least_k, Ranking, SelectionConfig};
use timely::dataflow::operators::probe::Handle as ProbeHandle;
use tracing::{debug, info, warn};

use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use crate::output::{ensure_absent, write_output};
use crate::partition::{plan_partitions, PartitionSpec};
use crate::{start_runtime, JobConfig, JobError};

#[derive(Debug, Clone)]
pub struct JobReport {
    pub results: Vec<Candidate>,
    pub partitions: usize,
    pub output: Option<PathBuf>,
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
}

/// Run a configured job end to end, writing results when an output location
/// is configured.
pub fn run_job(cfg: &JobConfig, metrics: &MetricsRegistry) -> Result<JobReport, JobError> {
    cfg.validate()?;
    if let Some(dir) = &cfg.output {
        ensure_absent(dir)?;
    }

    let started = Instant::now();
    let partitions = plan_partitions(&cfg.inputs, cfg.lines_per_partition)?;
    let partition_count = partitions.len();
    info!(k = cfg.k, workers = cfg.workers, partitions = partition_count, "job starting");

    let results = run_partitions(partitions, cfg.selection(), cfg.workers, metrics)?;

    let output = match &cfg.output {
        Some(dir) => Some(write_output(dir, &results)?),
        None => None,
    };
    let snapshot = metrics.snapshot();
    let elapsed = started.elapsed();
    info!(
        summary = %snapshot.to_json_line("job", Some(elapsed)),
        "job complete"
    );
    Ok(JobReport {
        results,
        partitions: partition_count,
        output,
        metrics: snapshot,
        elapsed,
    })
}

/// Execute the two-stage selection over `partitions` on `workers` timely
/// workers. Partitions are assigned round-robin by id.
pub fn run_partitions(
    partitions: Vec<PartitionSpec>,
    selection: SelectionConfig,
    workers: usize,
    metrics: &MetricsRegistry,
) -> Result<Vec<Candidate>, JobError> {
    let partitions = Arc::new(partitions);
    let sink: Arc<Mutex<Vec<Ranking>>> = Arc::default();

    let outcomes = {
        let sink = Arc::clone(&sink);
        let metrics = metrics.clone();
        start_runtime(workers, move |index, worker| {
            let peers = worker.peers();
            let mut input: InputSession<u64, (String, Count), isize> = InputSession::new();
            let mut probe = ProbeHandle::new();

            let out = Arc::clone(&sink);
            worker.dataflow::<u64, _, _>(|scope| {
                least_k(&input.to_collection(scope), &selection)
                    .inspect(move |(ranking, _time, diff)| {
                        if *diff > 0 {
                            out.lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .push(ranking.clone());
                        }
                    })
                    .probe_with(&mut probe);
            });

            let owned = partitions.iter().filter(|p| p.id % peers == index);
            let outcome = map_partitions(owned, selection.k, &metrics, &mut input);

            // Drain even after a failure so peers are not left waiting on this worker.
            input.advance_to(1);
            input.flush();
            while probe.less_than(input.time()) {
                worker.step();
            }
            outcome
        })?
    };
    for outcome in outcomes {
        outcome?;
    }

    let ranking = sink
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop()
        .unwrap_or_default();
    metrics.inc_groups_aggregated(ranking.groups);
    metrics.inc_global_evictions(ranking.evictions);
    if ranking.candidates.len() < selection.k {
        warn!(
            k = selection.k,
            found = ranking.candidates.len(),
            "fewer distinct entities than requested"
        );
    }
    Ok(ranking.candidates)
}

/// Map stage for one worker. Candidates of a partition are only offered to the
/// shuffle once the whole partition has been read without error.
fn map_partitions<'a, I>(
    partitions: I,
    k: usize,
    metrics: &MetricsRegistry,
    input: &mut InputSession<u64, (String, Count), isize>,
) -> Result<(), JobError>
where
    I: Iterator<Item = &'a PartitionSpec>,
{
    for spec in partitions {
        let selector = spec.select(k)?;
        let stats = selector.stats();
        let mut emitted = 0;
        for Record { name, count } in selector.finish() {
            input.insert((name, count));
            emitted += 1;
        }
        debug!(partition = spec.id, records = stats.records, emitted, "partition mapped");
        metrics.inc_records_read(stats.records);
        metrics.inc_local_evictions(stats.evictions);
        metrics.record_partition_size(stats.records);
        metrics.inc_candidates_emitted(emitted);
        metrics.inc_partitions_completed(1);
    }
    Ok(())
}
