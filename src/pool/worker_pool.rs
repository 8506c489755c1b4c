use super::pending::PendingTracker;
use crate::config::WorkgateConfig;
use crate::error::{PoolError, WorkgateError};
use crate::parallel::task::{Task, invoke};
use crossbeam::channel::{Receiver, Sender, bounded, select};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// State shared between the pool handle and its worker threads
#[derive(Debug)]
struct Shared {
    pending: PendingTracker,
    stopped: AtomicBool,
}

/// Fixed set of persistent worker threads draining a bounded FIFO queue
///
/// Submission is fire-and-forget: task errors and panics are logged and
/// swallowed inside the worker, which keeps serving the queue. Report results
/// through a side channel if they matter.
///
/// Lifecycle is `Running -> Stopped`; a stopped pool cannot be restarted.
pub struct WorkerPool {
    workers: usize,
    queue_tx: Sender<Job>,
    queue_rx: Receiver<Job>,
    // Dropped on stop; the disconnect wakes workers and blocked submitters
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Start `workers` threads over a queue holding up to `queue_size` tasks
    ///
    /// A `queue_size` of zero makes every submission a direct hand-off to an
    /// idle worker.
    pub fn new(workers: usize, queue_size: usize) -> Result<Self, WorkgateError> {
        if workers == 0 {
            return Err(WorkgateError::zero("workers"));
        }

        let (queue_tx, queue_rx) = bounded::<Job>(queue_size);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let pool = Self {
            workers,
            queue_tx,
            queue_rx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            handles: Mutex::new(Vec::with_capacity(workers)),
            shared: Arc::new(Shared {
                pending: PendingTracker::default(),
                stopped: AtomicBool::new(false),
            }),
        };

        for worker_id in 0..workers {
            let queue_rx = pool.queue_rx.clone();
            let shutdown_rx = pool.shutdown_rx.clone();
            let shared = pool.shared.clone();

            // On failure `pool` is dropped here, which stops the workers already started
            let handle = std::thread::Builder::new()
                .name(format!("workgate-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, queue_rx, shutdown_rx, shared))
                .map_err(|e| WorkgateError::spawn("worker", e))?;
            pool.handles.lock().push(handle);
        }

        tracing::debug!("Worker pool started: {} workers, queue size {}", workers, queue_size);
        Ok(pool)
    }

    pub fn from_config(config: &WorkgateConfig) -> Result<Self, WorkgateError> {
        Self::new(config.pool_workers(), config.pool.queue_size)
    }

    /// Queue a task; blocks while the queue is full
    ///
    /// Fails with [`PoolError::Closed`] once the pool is stopped, including when
    /// the stop happens while this call is blocked on a full queue.
    pub fn submit<K>(&self, task: K) -> Result<(), PoolError>
    where
        K: Task + 'static,
    {
        if self.shared.stopped.load(Ordering::SeqCst) {
            return Err(PoolError::Closed);
        }

        let job: Job = Box::new(move || {
            if let Err(err) = invoke(task) {
                if err.is_panic() {
                    tracing::warn!("Pool {}", err);
                } else {
                    tracing::debug!("Pool task failed: {}", err);
                }
            }
        });

        self.shared.pending.increment();
        select! {
            send(self.queue_tx, job) -> res => {
                if res.is_err() {
                    self.shared.pending.decrement();
                    return Err(PoolError::Closed);
                }
            }
            recv(self.shutdown_rx) -> _ => {
                self.shared.pending.decrement();
                return Err(PoolError::Closed);
            }
        }

        // Lost a race with `stop`: whatever is still queued, this task included,
        // will never run
        if self.shared.stopped.load(Ordering::SeqCst) {
            self.discard_queued();
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    /// Block until every submitted task has finished or been discarded
    pub fn wait(&self) {
        self.shared.pending.wait();
    }

    /// Like [`wait`](Self::wait) with an upper bound; true if the pool drained
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.shared.pending.wait_timeout(timeout)
    }

    /// Stop accepting work, let in-flight tasks finish and join every worker
    ///
    /// Tasks still queued when the workers exit are discarded, including tasks
    /// accepted before the stop began. A submission racing the stop fails with
    /// [`PoolError::Closed`] even when its send went through. Idempotent: later
    /// calls return immediately, concurrent calls block until the first finishes.
    pub fn stop(&self) {
        let mut shutdown_tx = self.shutdown_tx.lock();
        let Some(tx) = shutdown_tx.take() else {
            return;
        };

        self.shared.stopped.store(true, Ordering::SeqCst);
        drop(tx);

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("Worker thread exited with a panic");
            }
        }

        let discarded = self.discard_queued();
        tracing::debug!("Worker pool stopped ({} queued tasks discarded)", discarded);
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Submitted tasks that have not yet finished
    pub fn pending(&self) -> i64 {
        self.shared.pending.get()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn discard_queued(&self) -> usize {
        let mut discarded = 0;
        while let Ok(job) = self.queue_rx.try_recv() {
            drop(job);
            self.shared.pending.decrement();
            discarded += 1;
        }
        discarded
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("pending", &self.pending())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

fn worker_loop(
    worker_id: usize,
    queue_rx: Receiver<Job>,
    shutdown_rx: Receiver<()>,
    shared: Arc<Shared>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => break,
            recv(queue_rx) -> msg => match msg {
                Ok(job) => {
                    job();
                    shared.pending.decrement();
                }
                Err(_) => break,
            },
        }
    }
    tracing::trace!("Worker {} exiting", worker_id);
}
