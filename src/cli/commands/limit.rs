//! Rate limit command
//!
//! Performs `--count` operations through a [`RateLimiter`] and reports the
//! observed spacing.

use crate::cli::Output;
use crate::config::WorkgateConfig;
use crate::gate::RateLimiter;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::time::Instant;

#[derive(Args, Debug)]
pub struct LimitArgs {
    /// Operations per second (overrides limiter.rate)
    #[arg(long, allow_negative_numbers = true)]
    pub rate: Option<i64>,

    /// Number of operations to perform
    #[arg(long, default_value_t = 5)]
    pub count: u32,
}

#[derive(Debug, Serialize)]
struct LimitReport {
    rate: i64,
    count: u32,
    interval_ms: u128,
    elapsed_ms: u128,
}

pub fn execute(args: LimitArgs, config: &WorkgateConfig, output: &Output) -> Result<()> {
    let mut config = config.clone();
    if let Some(rate) = args.rate {
        config.limiter.rate = rate;
    }
    let rate = config.limiter.rate;
    let limiter = RateLimiter::from_config(&config).context("Failed to build rate limiter")?;

    output.header("Rate Limiter");
    output.info(&format!("Performing {} operations at {}/s", args.count, rate));
    let start = Instant::now();
    for op in 1..=args.count {
        limiter.wait()?;
        output.verbose(&format!(
            "operation {op} at {}ms",
            start.elapsed().as_millis()
        ));
    }
    let elapsed = start.elapsed();
    limiter.close();

    let report = LimitReport {
        rate,
        count: args.count,
        interval_ms: limiter.interval().as_millis(),
        elapsed_ms: elapsed.as_millis(),
    };

    output.key_value("Rate:", &format!("{}/s", report.rate), false);
    output.key_value("Operations:", &report.count.to_string(), false);
    output.key_value("Interval:", &format!("{}ms", report.interval_ms), false);
    output.key_value("Elapsed:", &format!("{}ms", report.elapsed_ms), true);
    output.report(&report)?;

    Ok(())
}
