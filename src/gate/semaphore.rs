use crate::error::WorkgateError;
use crossbeam::channel::{Receiver, Sender, bounded};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Bounded-capacity admission gate
///
/// Each outstanding acquisition occupies one slot of a bounded channel, so
/// `0 <= outstanding <= capacity` holds at every observation point.
#[derive(Debug)]
pub struct CountingSemaphore {
    capacity: usize,
    slots_tx: Sender<()>,
    slots_rx: Receiver<()>,
}

/// Held slot that is released when dropped
#[derive(Debug)]
pub struct Permit<'a> {
    semaphore: &'a CountingSemaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

impl CountingSemaphore {
    pub fn new(capacity: usize) -> Result<Self, WorkgateError> {
        NonZeroUsize::new(capacity)
            .map(Self::with_capacity)
            .ok_or(WorkgateError::zero("semaphore capacity"))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        let (slots_tx, slots_rx) = bounded(capacity.get());
        Self {
            capacity: capacity.get(),
            slots_tx,
            slots_rx,
        }
    }

    /// Block until a slot is free, then take it
    pub fn acquire(&self) {
        // The receiver lives in `self`, so the channel can never disconnect here
        let _ = self.slots_tx.send(());
    }

    /// Block up to `timeout`; returns false without taking a slot on expiry
    pub fn acquire_with_timeout(&self, timeout: Duration) -> bool {
        self.slots_tx.send_timeout((), timeout).is_ok()
    }

    /// Take a slot only if one is immediately free
    pub fn try_acquire(&self) -> bool {
        self.slots_tx.try_send(()).is_ok()
    }

    /// Acquire a slot and hand back a guard that releases it on drop
    pub fn acquire_permit(&self) -> Permit<'_> {
        self.acquire();
        Permit { semaphore: self }
    }

    /// Return a slot to the gate
    ///
    /// An unmatched release is ignored so free capacity never exceeds `capacity`.
    pub fn release(&self) {
        if self.slots_rx.try_recv().is_err() {
            tracing::warn!("Semaphore released without a matching acquire; ignoring");
        }
    }

    /// Free capacity right now; stale as soon as it is read
    pub fn available(&self) -> usize {
        self.capacity - self.slots_rx.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::AtomicCounter;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(CountingSemaphore::new(0).is_err());
    }

    #[test]
    fn test_try_acquire_on_full_semaphore() {
        let sem = CountingSemaphore::new(2).unwrap();
        assert!(sem.try_acquire());
        assert!(sem.try_acquire());
        assert_eq!(sem.available(), 0);
        assert!(!sem.try_acquire());

        sem.release();
        assert_eq!(sem.available(), 1);
        assert!(sem.try_acquire());
    }

    #[test]
    fn test_acquire_with_timeout_does_not_consume_on_expiry() {
        let sem = CountingSemaphore::new(1).unwrap();
        sem.acquire();

        let start = Instant::now();
        assert!(!sem.acquire_with_timeout(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(sem.available(), 0);

        sem.release();
        assert!(sem.acquire_with_timeout(Duration::from_millis(30)));
    }

    #[test]
    fn test_unmatched_release_keeps_capacity_bounded() {
        let sem = CountingSemaphore::new(3).unwrap();
        sem.release();
        sem.release();
        assert_eq!(sem.available(), 3);
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let sem = CountingSemaphore::new(1).unwrap();
        {
            let _permit = sem.acquire_permit();
            assert_eq!(sem.available(), 0);
        }
        assert_eq!(sem.available(), 1);
    }

    #[test]
    fn test_outstanding_never_exceeds_capacity() {
        let sem = CountingSemaphore::new(3).unwrap();
        let current = Arc::new(AtomicCounter::default());
        let peak = Arc::new(AtomicCounter::default());

        crossbeam::thread::scope(|s| {
            for _ in 0..12 {
                let (sem, current, peak) = (&sem, current.clone(), peak.clone());
                s.spawn(move |_| {
                    let _permit = sem.acquire_permit();
                    let now = current.increment();
                    assert!(now <= 3);
                    if now > peak.get() {
                        peak.set(now);
                    }
                    std::thread::sleep(Duration::from_millis(5));
                    current.decrement();
                });
            }
        })
        .unwrap();

        assert!(peak.get() <= 3);
        assert_eq!(sem.available(), 3);
    }
}
