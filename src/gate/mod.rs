//! Admission control: counting semaphore and token rate limiter
//!
//! Both gates are usable standalone. The semaphore also provides the
//! admission slots for [`crate::parallel::ParallelRunner`].

pub mod rate_limiter;
pub mod semaphore;

pub use rate_limiter::{RateLimiter, run_with_rate_limit};
pub use semaphore::{CountingSemaphore, Permit};
