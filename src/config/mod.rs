//! Configuration management for workgate
//!
//! Typed settings for every component, loaded by [`WorkgateConfig::load`] from
//! embedded defaults, optional user and repository files, and `WORKGATE_`
//! environment variables.

mod core;

use crate::parallel::calculate_optimal_workers;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct WorkgateConfig {
    pub general: GeneralConfig,
    pub pool: PoolConfig,
    pub parallel: ParallelConfig,
    pub limiter: LimiterConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Percentage of CPU cores used when a worker count is left at 0 (1-100)
    pub thread_percentage: u8,
}

/// Worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Worker threads (0 = derive from CPU count)
    pub workers: usize,

    /// Bounded queue capacity
    pub queue_size: usize,
}

/// Parallel runner settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParallelConfig {
    /// Tasks allowed to run at once (0 = derive from CPU count)
    pub max_concurrency: usize,

    /// Best-effort batch deadline in milliseconds (0 = none)
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimiterConfig {
    /// Operations per second
    pub rate: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub chunk_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            thread_percentage: 75,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_size: 64,
        }
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 0,
            timeout_ms: 0,
        }
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self { rate: 10 }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { chunk_size: 100 }
    }
}

impl WorkgateConfig {
    /// Reject settings no component can be built from
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (1..=100).contains(&self.general.thread_percentage),
            "general.thread_percentage must be between 1 and 100, got {}",
            self.general.thread_percentage
        );
        anyhow::ensure!(
            self.limiter.rate > 0,
            "limiter.rate must be positive, got {}",
            self.limiter.rate
        );
        anyhow::ensure!(self.batch.chunk_size > 0, "batch.chunk_size must be positive");
        Ok(())
    }

    /// Worker count for the pool, resolving 0 against available cores
    pub fn pool_workers(&self) -> usize {
        self.resolve_workers(self.pool.workers)
    }

    /// Concurrency bound for parallel runs, resolving 0 against available cores
    pub fn max_concurrency(&self) -> usize {
        self.resolve_workers(self.parallel.max_concurrency)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.parallel.timeout_ms)
    }

    fn resolve_workers(&self, configured: usize) -> usize {
        if configured > 0 {
            configured
        } else {
            calculate_optimal_workers(0, self.general.thread_percentage)
        }
    }
}
