use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lk_runtime::metrics::MetricsRegistry;
use lk_runtime::output::read_output;
use lk_runtime::{init_tracing, run_job, JobConfig};

/// Select the K entities with the smallest aggregate counts from
/// tab-separated `<name>\t<count>` input.
#[derive(Debug, Parser)]
#[command(name = "least_k")]
struct Args {
    /// Input files or directories, followed by the output directory.
    paths: Vec<PathBuf>,
    /// Number of results to keep.
    #[arg(short, long)]
    k: Option<usize>,
    /// Timely worker threads.
    #[arg(short, long)]
    workers: Option<usize>,
    /// Split input files into partitions of this many lines.
    #[arg(long)]
    lines_per_partition: Option<usize>,
    /// JSON job configuration; command-line values take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => JobConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => JobConfig::default(),
    };
    if let Some(k) = args.k {
        cfg.k = k;
    }
    if let Some(workers) = args.workers {
        cfg.workers = workers;
    }
    if args.lines_per_partition.is_some() {
        cfg.lines_per_partition = args.lines_per_partition;
    }
    cfg.apply_paths(&args.paths);

    if cfg.inputs.is_empty() || cfg.output.is_none() {
        eprintln!("Error: please provide two paths");
        std::process::exit(2);
    }

    let metrics = MetricsRegistry::default();
    let report = run_job(&cfg, &metrics).context("least-k job failed")?;
    info!(
        results = report.results.len(),
        partitions = report.partitions,
        elapsed_ms = report.elapsed.as_millis(),
        output = ?report.output,
        "least_k finished"
    );

    // Echo what was written, read back from the part file.
    if let Some(dir) = &cfg.output {
        for candidate in read_output(dir).context("reading job output")? {
            println!("{candidate}");
        }
    }
    Ok(())
}
