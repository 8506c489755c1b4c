use crate::error::TaskError;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A single opaque unit of work, consumed when it runs
///
/// Any `FnOnce() -> anyhow::Result<T> + Send` closure is a task. Implement the
/// trait directly for task types that carry their own state.
pub trait Task: Send {
    type Output: Send;

    fn run(self) -> anyhow::Result<Self::Output>;
}

impl<T, F> Task for F
where
    F: FnOnce() -> anyhow::Result<T> + Send,
    T: Send,
{
    type Output = T;

    fn run(self) -> anyhow::Result<T> {
        self()
    }
}

/// Run a task inside a panic boundary, turning every failure into a `TaskError`
pub(crate) fn invoke<K: Task>(task: K) -> Result<K::Output, TaskError> {
    match catch_unwind(AssertUnwindSafe(|| task.run())) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TaskError::Failed(err)),
        Err(payload) => Err(TaskError::from_panic(payload)),
    }
}

/// Outcome of one task, tied back to its position in the submitted batch
#[derive(Debug)]
pub struct TaskResult<T> {
    pub index: usize,
    pub outcome: Result<T, TaskError>,
}

impl<T> TaskResult<T> {
    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn into_result(self) -> Result<T, TaskError> {
        self.outcome
    }
}

/// Caller-owned cancellation flag shared with a running batch
///
/// Cancellation is observed only before a task starts; tasks already running
/// are never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler(u32);

    impl Task for Doubler {
        type Output = u32;

        fn run(self) -> anyhow::Result<u32> {
            Ok(self.0 * 2)
        }
    }

    #[test]
    fn test_closures_and_structs_are_tasks() {
        let closure = || Ok::<_, anyhow::Error>("done");
        assert_eq!(closure.run().unwrap(), "done");
        assert_eq!(Doubler(21).run().unwrap(), 42);
    }

    #[test]
    fn test_invoke_isolates_failures() {
        assert_eq!(invoke(|| Ok::<_, anyhow::Error>(1)).unwrap(), 1);

        let err = invoke(|| -> anyhow::Result<()> { anyhow::bail!("bad input") }).unwrap_err();
        assert_eq!(err.to_string(), "bad input");

        let err = invoke(|| -> anyhow::Result<()> { panic!("kaboom") }).unwrap_err();
        assert!(err.is_panic());
        assert!(err.to_string().contains("kaboom"));
    }

    #[test]
    fn test_task_result_accessors() {
        let ok = TaskResult {
            index: 0,
            outcome: Ok::<_, TaskError>(5),
        };
        assert!(ok.is_ok());
        assert_eq!(ok.value(), Some(&5));
        assert!(ok.error().is_none());

        let failed: TaskResult<i32> = TaskResult {
            index: 1,
            outcome: Err(TaskError::DeadlineExceeded),
        };
        assert!(failed.error().unwrap().is_deadline_exceeded());
        assert!(failed.into_result().is_err());
    }

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
