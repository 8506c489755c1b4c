//! Config command
//!
//! Prints the fully merged configuration.

use crate::cli::Output;
use crate::config::WorkgateConfig;
use anyhow::Result;

pub fn execute(config: &WorkgateConfig, output: &Output) -> Result<()> {
    if output.is_json() {
        return output.report(config);
    }

    output.header("Resolved Configuration");
    output.key_value(
        "thread_percentage",
        &config.general.thread_percentage.to_string(),
        false,
    );
    output.key_value("pool.workers", &config.pool.workers.to_string(), false);
    output.key_value("pool.queue_size", &config.pool.queue_size.to_string(), false);
    output.key_value(
        "max_concurrency",
        &config.parallel.max_concurrency.to_string(),
        false,
    );
    output.key_value("timeout_ms", &config.parallel.timeout_ms.to_string(), false);
    output.key_value("limiter.rate", &config.limiter.rate.to_string(), false);
    output.key_value("batch.chunk_size", &config.batch.chunk_size.to_string(), false);

    output.verbose(&format!(
        "Effective workers: pool {}, parallel {}",
        config.pool_workers(),
        config.max_concurrency()
    ));

    Ok(())
}
