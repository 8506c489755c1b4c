//! Worker pool command
//!
//! Submits sleeping tasks to a fixed pool and reports how long the pool took
//! to drain them.

use crate::cli::Output;
use crate::config::WorkgateConfig;
use crate::pool::WorkerPool;
use crate::shared::AtomicCounter;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Args, Debug)]
pub struct PoolArgs {
    /// Number of tasks to submit
    #[arg(long, default_value_t = 10)]
    pub tasks: usize,

    /// Milliseconds each task sleeps
    #[arg(long, default_value_t = 10)]
    pub sleep_ms: u64,

    /// Worker threads (overrides pool.workers)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Queue capacity (overrides pool.queue_size)
    #[arg(long)]
    pub queue: Option<usize>,
}

#[derive(Debug, Serialize)]
struct PoolReport {
    workers: usize,
    queue_size: usize,
    submitted: usize,
    completed: i64,
    elapsed_ms: u128,
}

pub fn execute(args: PoolArgs, config: &WorkgateConfig, output: &Output) -> Result<()> {
    let mut config = config.clone();
    if let Some(workers) = args.workers {
        config.pool.workers = workers;
    }
    if let Some(queue) = args.queue {
        config.pool.queue_size = queue;
    }
    let pool = WorkerPool::from_config(&config).context("Failed to start worker pool")?;
    let workers = pool.workers();
    let queue_size = config.pool.queue_size;

    output.verbose(&format!(
        "Submitting {} tasks of {}ms to {} workers",
        args.tasks, args.sleep_ms, workers
    ));

    let completed = Arc::new(AtomicCounter::new(0));
    let sleep = Duration::from_millis(args.sleep_ms);
    let start = Instant::now();

    for _ in 0..args.tasks {
        let completed = Arc::clone(&completed);
        pool.submit(move || -> Result<()> {
            std::thread::sleep(sleep);
            completed.increment();
            Ok(())
        })?;
    }

    pool.wait();
    let elapsed = start.elapsed();
    pool.stop();

    let report = PoolReport {
        workers,
        queue_size,
        submitted: args.tasks,
        completed: completed.get(),
        elapsed_ms: elapsed.as_millis(),
    };

    output.header("Worker Pool");
    output.key_value("Workers:", &report.workers.to_string(), false);
    output.key_value("Queue size:", &report.queue_size.to_string(), false);
    output.key_value("Submitted:", &report.submitted.to_string(), false);
    output.key_value("Completed:", &report.completed.to_string(), true);
    output.key_value("Elapsed:", &format!("{}ms", report.elapsed_ms), false);
    output.report(&report)?;
    output.success("Pool drained");

    Ok(())
}
