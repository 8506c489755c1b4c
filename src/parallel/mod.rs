//! Bounded parallel execution of independent tasks
//!
//! [`ParallelRunner`] is the synchronous batch entry point: it admits tasks
//! through a [`crate::gate::CountingSemaphore`], runs each one on its own scoped
//! thread inside a panic boundary, and returns results in submission order.
//! [`BatchChunker`] builds on it to process large inputs chunk by chunk.
//!
//! ```rust
//! use std::time::Duration;
//! use workgate::parallel::ParallelRunner;
//!
//! let runner = ParallelRunner::new(2, Duration::ZERO)?;
//! let tasks: Vec<_> = (1..=3)
//!     .map(|n| move || Ok::<_, anyhow::Error>(n * n))
//!     .collect();
//!
//! let squares: Vec<_> = runner
//!     .run(tasks)
//!     .into_iter()
//!     .filter_map(|r| r.into_result().ok())
//!     .collect();
//! assert_eq!(squares, vec![1, 4, 9]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod core;
pub mod task;

pub use batch::{BatchChunker, process_in_batches};
pub use self::core::{ParallelRunner, calculate_optimal_workers, run_concurrently, run_with_timeout};
pub use task::{CancelToken, Task, TaskResult};
