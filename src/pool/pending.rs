use crate::shared::AtomicCounter;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Count of submitted-but-unfinished tasks with a wake-up on reaching zero
///
/// The count itself is a lock-free [`AtomicCounter`]; the mutex only orders a
/// waiter's zero-check against the notify so no wake-up is lost.
#[derive(Debug, Default)]
pub(crate) struct PendingTracker {
    count: AtomicCounter,
    lock: Mutex<()>,
    drained: Condvar,
}

impl PendingTracker {
    pub(crate) fn increment(&self) {
        self.count.increment();
    }

    pub(crate) fn decrement(&self) {
        if self.count.decrement() <= 0 {
            let _guard = self.lock.lock();
            self.drained.notify_all();
        }
    }

    pub(crate) fn get(&self) -> i64 {
        self.count.get()
    }

    /// Block until the count reaches zero
    pub(crate) fn wait(&self) {
        let mut guard = self.lock.lock();
        while self.count.get() > 0 {
            self.drained.wait(&mut guard);
        }
    }

    /// Block until the count reaches zero or `timeout` elapses; true if drained
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        while self.count.get() > 0 {
            if self.drained.wait_until(&mut guard, deadline).timed_out() {
                return self.count.get() <= 0;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_returns_immediately_when_idle() {
        let tracker = PendingTracker::default();
        tracker.wait();
        assert!(tracker.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn test_wait_wakes_on_last_decrement() {
        let tracker = PendingTracker::default();
        for _ in 0..3 {
            tracker.increment();
        }

        crossbeam::thread::scope(|s| {
            s.spawn(|_| {
                for _ in 0..3 {
                    std::thread::sleep(Duration::from_millis(5));
                    tracker.decrement();
                }
            });
            tracker.wait();
            assert_eq!(tracker.get(), 0);
        })
        .unwrap();
    }

    #[test]
    fn test_wait_timeout_expires() {
        let tracker = PendingTracker::default();
        tracker.increment();
        assert!(!tracker.wait_timeout(Duration::from_millis(20)));
        tracker.decrement();
        assert!(tracker.wait_timeout(Duration::from_millis(20)));
    }
}
