//! # workgate - thread-based concurrency coordination
//!
//! Small, synchronous building blocks for running work on OS threads with
//! explicit bounds.
//!
//! ## Components
//!
//! - **Worker pool**: fixed workers draining a bounded queue, with wait and stop
//! - **Parallel runner**: bounded concurrency, per-task panic isolation,
//!   results in submission order, optional best-effort deadline
//! - **Batch chunker**: chunked processing of large inputs
//! - **Gates**: counting semaphore and token-based rate limiter
//! - **Shared state**: atomic counter and guarded map
//!
//! ## Quick Start
//!
//! ```bash
//! # Drain 20 sleeping tasks through 4 workers
//! workgate pool --tasks 20 --workers 4
//!
//! # Run tasks two at a time, with task 3 failing
//! workgate run --tasks 6 --max-concurrency 2 --fail 3
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod parallel;
pub mod pool;
pub mod shared;

pub use cli::{Cli, Output};
pub use config::WorkgateConfig;
pub use error::{PoolError, TaskError, WorkgateError};
pub use gate::{CountingSemaphore, RateLimiter};
pub use parallel::{BatchChunker, ParallelRunner, Task, TaskResult};
pub use pool::WorkerPool;

/// Result type alias for workgate operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
