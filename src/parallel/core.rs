use super::task::{CancelToken, Task, TaskResult, invoke};
use crate::config::WorkgateConfig;
use crate::error::{TaskError, WorkgateError};
use crate::gate::CountingSemaphore;
use crossbeam::channel::unbounded;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Runs a batch of independent tasks with bounded concurrency
///
/// Every call to [`run`](Self::run) is independent: it builds its own admission
/// gate and deadline, and returns one [`TaskResult`] per task in input order.
///
/// # Deadline semantics
///
/// The deadline is best-effort. Each execution unit checks it once, right
/// before invoking its task; a task that has already started is never
/// interrupted, it simply finishes late. Units that see an expired deadline
/// record [`TaskError::DeadlineExceeded`] without running their task.
#[derive(Debug, Clone, Copy)]
pub struct ParallelRunner {
    max_concurrency: NonZeroUsize,
    timeout: Duration,
}

impl ParallelRunner {
    /// `timeout` of zero means no deadline
    pub fn new(max_concurrency: usize, timeout: Duration) -> Result<Self, WorkgateError> {
        let max_concurrency =
            NonZeroUsize::new(max_concurrency).ok_or(WorkgateError::zero("max_concurrency"))?;
        Ok(Self {
            max_concurrency,
            timeout,
        })
    }

    pub fn from_config(config: &WorkgateConfig) -> Result<Self, WorkgateError> {
        Self::new(config.max_concurrency(), config.timeout())
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency.get()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute all tasks and block until every one has reported
    pub fn run<K: Task>(&self, tasks: Vec<K>) -> Vec<TaskResult<K::Output>> {
        self.execute(tasks, None)
    }

    /// Like [`run`](Self::run), but units that start after `cancel` fires
    /// record [`TaskError::Cancelled`] instead of running
    pub fn run_with_cancel<K: Task>(
        &self,
        cancel: &CancelToken,
        tasks: Vec<K>,
    ) -> Vec<TaskResult<K::Output>> {
        self.execute(tasks, Some(cancel))
    }

    fn execute<K: Task>(
        &self,
        tasks: Vec<K>,
        cancel: Option<&CancelToken>,
    ) -> Vec<TaskResult<K::Output>> {
        let total = tasks.len();
        if total == 0 {
            return Vec::new();
        }

        let gate = CountingSemaphore::with_capacity(self.max_concurrency);
        let deadline = (!self.timeout.is_zero()).then(|| Instant::now() + self.timeout);
        let (result_tx, result_rx) = unbounded();

        tracing::debug!(
            "Running {} tasks (max_concurrency={}, timeout={:?})",
            total,
            self.max_concurrency,
            self.timeout
        );

        let scope_result = crossbeam::thread::scope(|s| {
            for (index, task) in tasks.into_iter().enumerate() {
                // Admission: hold a slot for the whole lifetime of the unit
                let permit = gate.acquire_permit();
                let result_tx = result_tx.clone();

                s.spawn(move |_| {
                    let outcome = run_unit(index, task, deadline, cancel);
                    let _ = result_tx.send(TaskResult { index, outcome });
                    drop(permit);
                });
            }
        });

        if scope_result.is_err() {
            tracing::error!("Execution unit panicked outside the task boundary");
        }
        drop(result_tx);

        let mut slots: Vec<Option<TaskResult<K::Output>>> = (0..total).map(|_| None).collect();
        for result in result_rx.try_iter() {
            let index = result.index;
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| TaskResult {
                    index,
                    outcome: Err(TaskError::Panicked(
                        "execution unit exited without reporting".to_string(),
                    )),
                })
            })
            .collect()
    }
}

fn run_unit<K: Task>(
    index: usize,
    task: K,
    deadline: Option<Instant>,
    cancel: Option<&CancelToken>,
) -> Result<K::Output, TaskError> {
    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        tracing::debug!("Task {} skipped: deadline exceeded", index);
        return Err(TaskError::DeadlineExceeded);
    }
    if cancel.is_some_and(CancelToken::is_cancelled) {
        tracing::debug!("Task {} skipped: run cancelled", index);
        return Err(TaskError::Cancelled);
    }

    let outcome = invoke(task);
    if let Err(err) = &outcome {
        tracing::debug!("Task {} failed: {}", index, err);
    }
    outcome
}

/// One-shot run with a deadline and one slot per task
pub fn run_with_timeout<K: Task>(timeout: Duration, tasks: Vec<K>) -> Vec<TaskResult<K::Output>> {
    let max_concurrency = NonZeroUsize::new(tasks.len()).unwrap_or(NonZeroUsize::MIN);
    ParallelRunner {
        max_concurrency,
        timeout,
    }
    .run(tasks)
}

/// One-shot run with bounded concurrency and no deadline
pub fn run_concurrently<K: Task>(
    max_concurrency: usize,
    tasks: Vec<K>,
) -> Result<Vec<TaskResult<K::Output>>, WorkgateError> {
    Ok(ParallelRunner::new(max_concurrency, Duration::ZERO)?.run(tasks))
}

/// Worker count derived from available cores and configuration limits
///
/// ```text
/// 1. cores * thread_percentage / 100, at least 1
/// 2. capped by max_threads_config when it is non-zero
/// ```
pub fn calculate_optimal_workers(max_threads_config: usize, thread_percentage: u8) -> usize {
    let available_cores = num_cpus::get();

    let workers_by_percentage =
        std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

    if max_threads_config > 0 {
        std::cmp::min(max_threads_config, workers_by_percentage)
    } else {
        workers_by_percentage
    }
}
