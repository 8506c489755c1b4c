//! Command implementations for the workgate CLI
//!
//! Each command builds one component from the resolved configuration,
//! drives it with a synthetic workload and reports the outcome.

pub mod batch;
pub mod config;
pub mod limit;
pub mod pool;
pub mod run;
