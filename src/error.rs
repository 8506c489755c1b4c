//! Error types surfaced by workgate components
//!
//! Task-level failures are carried as data inside [`crate::parallel::TaskResult`];
//! only API misuse (submitting to a stopped pool, invalid construction parameters)
//! is returned directly at the call site.

use thiserror::Error;

/// Why a single task did not produce a value
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task ran and returned its own error
    #[error(transparent)]
    Failed(anyhow::Error),

    /// The task panicked; the payload message is preserved when it was a string
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The shared deadline elapsed before the task was started
    #[error("deadline exceeded before task started")]
    DeadlineExceeded,

    /// The caller's cancel token fired before the task was started
    #[error("run cancelled before task started")]
    Cancelled,
}

impl TaskError {
    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked(_))
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, TaskError::DeadlineExceeded)
    }

    /// Build a `Panicked` error from a `catch_unwind` payload
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskError::Panicked(message)
    }
}

/// Errors returned by [`crate::pool::WorkerPool`]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Submission attempted after or during shutdown
    #[error("worker pool is closed")]
    Closed,
}

/// Invalid construction parameters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkgateError {
    #[error("rate must be a positive number of operations per second, got {0}")]
    InvalidRate(i64),

    #[error("{name} must be greater than zero")]
    ZeroSized { name: &'static str },

    #[error("rate limiter is closed")]
    LimiterClosed,

    #[error("failed to spawn {what} thread: {reason}")]
    Spawn { what: &'static str, reason: String },
}

impl WorkgateError {
    pub(crate) fn zero(name: &'static str) -> Self {
        WorkgateError::ZeroSized { name }
    }

    pub(crate) fn spawn(what: &'static str, err: std::io::Error) -> Self {
        WorkgateError::Spawn {
            what,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_displays_task_message() {
        let err = TaskError::Failed(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_panic_payloads() {
        let err = TaskError::from_panic(Box::new("static message"));
        assert!(err.is_panic());
        assert_eq!(err.to_string(), "task panicked: static message");

        let err = TaskError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err.to_string(), "task panicked: owned");

        let err = TaskError::from_panic(Box::new(42_u32));
        assert_eq!(err.to_string(), "task panicked: non-string panic payload");
    }
}
