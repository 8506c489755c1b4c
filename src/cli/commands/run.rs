//! Parallel run command
//!
//! Runs a batch of tasks under a concurrency bound and an optional deadline,
//! printing one outcome per task in submission order.

use crate::cli::Output;
use crate::config::WorkgateConfig;
use crate::parallel::ParallelRunner;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Number of tasks to run
    #[arg(long, default_value_t = 5)]
    pub tasks: usize,

    /// Milliseconds each task sleeps
    #[arg(long, default_value_t = 10)]
    pub sleep_ms: u64,

    /// Tasks allowed to run at once (overrides parallel.max_concurrency)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Batch deadline in milliseconds (overrides parallel.timeout_ms, 0 = none)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Task indices that return an error
    #[arg(long, value_delimiter = ',')]
    pub fail: Vec<usize>,

    /// Task indices that panic
    #[arg(long, value_delimiter = ',')]
    pub panic: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct TaskReport {
    index: usize,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    max_concurrency: usize,
    timeout_ms: u64,
    succeeded: usize,
    failed: usize,
    elapsed_ms: u128,
    results: Vec<TaskReport>,
}

pub fn execute(args: RunArgs, config: &WorkgateConfig, output: &Output) -> Result<()> {
    let mut config = config.clone();
    if let Some(max_concurrency) = args.max_concurrency {
        config.parallel.max_concurrency = max_concurrency;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.parallel.timeout_ms = timeout_ms;
    }
    let runner = ParallelRunner::from_config(&config).context("Failed to build parallel runner")?;

    let sleep = Duration::from_millis(args.sleep_ms);
    let tasks: Vec<_> = (0..args.tasks)
        .map(|index| {
            let fail = args.fail.contains(&index);
            let panic = args.panic.contains(&index);
            move || -> Result<usize> {
                std::thread::sleep(sleep);
                if panic {
                    panic!("task {index} panicked on request");
                }
                if fail {
                    anyhow::bail!("task {index} failed on request");
                }
                Ok(index)
            }
        })
        .collect();

    let start = Instant::now();
    let results = runner.run(tasks);
    let elapsed = start.elapsed();

    let results: Vec<TaskReport> = results
        .into_iter()
        .map(|result| TaskReport {
            index: result.index,
            ok: result.is_ok(),
            value: result.value().copied(),
            error: result.error().map(|err| err.to_string()),
        })
        .collect();
    let succeeded = results.iter().filter(|r| r.ok).count();

    let report = RunReport {
        max_concurrency: runner.max_concurrency(),
        timeout_ms: config.parallel.timeout_ms,
        succeeded,
        failed: results.len() - succeeded,
        elapsed_ms: elapsed.as_millis(),
        results,
    };

    output.header("Parallel Run");
    for task in &report.results {
        let detail = match (&task.value, &task.error) {
            (Some(value), _) => format!("returned {value}"),
            (_, Some(error)) => error.clone(),
            _ => String::new(),
        };
        output.action_result(&format!("task {}", task.index), &detail, task.ok);
    }
    output.key_value("Succeeded:", &report.succeeded.to_string(), true);
    output.key_value("Failed:", &report.failed.to_string(), report.failed > 0);
    output.key_value("Elapsed:", &format!("{}ms", report.elapsed_ms), false);
    output.report(&report)?;

    Ok(())
}
