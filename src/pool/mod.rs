//! Fire-and-forget worker pool
//!
//! ```rust
//! use workgate::pool::WorkerPool;
//! use workgate::shared::AtomicCounter;
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::new(2, 16)?;
//! let done = Arc::new(AtomicCounter::default());
//!
//! for _ in 0..10 {
//!     let done = done.clone();
//!     pool.submit(move || -> anyhow::Result<()> {
//!         done.increment();
//!         Ok(())
//!     })?;
//! }
//!
//! pool.wait();
//! pool.stop();
//! assert_eq!(done.get(), 10);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod pending;
pub mod worker_pool;

pub use worker_pool::WorkerPool;
