//! Batch command
//!
//! Splits `1..=items` into chunks and sums each chunk in parallel. A chunk that
//! contains `--fail-on` fails, which makes the command exit non-zero.

use crate::cli::Output;
use crate::config::WorkgateConfig;
use crate::parallel::BatchChunker;
use crate::shared::AtomicCounter;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Number of items to process
    #[arg(long, default_value_t = 1000)]
    pub items: u64,

    /// Items per chunk (overrides batch.chunk_size)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Chunks processed at once (overrides parallel.max_concurrency)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Fail the chunk containing this value
    #[arg(long)]
    pub fail_on: Option<u64>,
}

#[derive(Debug, Serialize)]
struct BatchReport {
    items: u64,
    chunk_size: usize,
    chunks: i64,
    sum: i64,
}

pub fn execute(args: BatchArgs, config: &WorkgateConfig, output: &Output) -> Result<()> {
    let mut config = config.clone();
    if let Some(chunk_size) = args.chunk_size {
        config.batch.chunk_size = chunk_size;
    }
    if let Some(max_concurrency) = args.max_concurrency {
        config.parallel.max_concurrency = max_concurrency;
    }
    let chunker = BatchChunker::from_config(&config).context("Failed to build batch chunker")?;
    let chunk_size = chunker.chunk_size();

    let items: Vec<u64> = (1..=args.items).collect();
    let chunks = AtomicCounter::new(0);
    let sum = AtomicCounter::new(0);

    let result = chunker.process(&items, |chunk| {
        if let Some(bad) = args.fail_on
            && chunk.contains(&bad)
        {
            anyhow::bail!("chunk containing {bad} failed");
        }
        let chunk_sum: u64 = chunk.iter().sum();
        sum.add(chunk_sum as i64);
        chunks.increment();
        Ok(())
    });

    if let Err(err) = result {
        output.error(&format!("Chunk failed: {err}"));
        return Err(err).context("Batch processing failed");
    }

    let report = BatchReport {
        items: args.items,
        chunk_size,
        chunks: chunks.get(),
        sum: sum.get(),
    };

    output.header("Batch");
    output.key_value("Items:", &report.items.to_string(), false);
    output.key_value("Chunk size:", &report.chunk_size.to_string(), false);
    output.key_value("Chunks:", &report.chunks.to_string(), false);
    output.key_value("Sum:", &report.sum.to_string(), true);
    output.report(&report)?;
    output.success("All chunks processed");

    Ok(())
}
