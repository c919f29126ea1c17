//! Runtime for least-K jobs: tracing bootstrap, the timely execution harness,
//! input partitioning, and the output sink.

use timely::communication::allocator::Generic;
use timely::worker::Worker;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod job;
pub mod metrics;
pub mod output;
pub mod partition;

pub use config::JobConfig;
pub use error::JobError;
pub use job::{run_job, run_partitions, JobReport};

/// Install the fmt subscriber once; `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Start a single-process timely runtime with `workers` threads and execute
/// the provided closure once per worker, collecting each worker's result.
pub fn start_runtime<T, F>(workers: usize, f: F) -> Result<Vec<T>, JobError>
where
    T: Send + 'static,
    F: Fn(usize, &mut Worker<Generic>) -> T + Send + Sync + 'static,
{
    let workers = workers.max(1);
    info!(%workers, "starting timely runtime");
    let guards = timely::execute(timely::Config::process(workers), move |worker| {
        let index = worker.index();
        f(index, worker)
    })
    .map_err(JobError::Runtime)?;
    guards
        .join()
        .into_iter()
        .collect::<Result<Vec<_>, String>>()
        .map_err(JobError::Runtime)
}
