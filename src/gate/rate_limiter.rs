use crate::config::WorkgateConfig;
use crate::error::WorkgateError;
use crossbeam::channel::{Receiver, Sender, bounded, select, tick};
use parking_lot::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

/// Token-based rate limiter with a single-token buffer
///
/// A background thread deposits one token every `interval`. When a token is
/// already buffered the tick is dropped, so there is never more than one token
/// of burst capacity.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    tokens_rx: Receiver<()>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    generator: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` operations per second
    pub fn new(rate: i64) -> Result<Self, WorkgateError> {
        let interval = interval_for_rate(rate)?;

        let (tokens_tx, tokens_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let generator = std::thread::Builder::new()
            .name("workgate-limiter".to_string())
            .spawn(move || generate_tokens(interval, tokens_tx, shutdown_rx))
            .map_err(|e| WorkgateError::spawn("rate limiter", e))?;

        tracing::debug!("Rate limiter started: {} ops/s ({:?} interval)", rate, interval);

        Ok(Self {
            interval,
            tokens_rx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            generator: Mutex::new(Some(generator)),
        })
    }

    pub fn from_config(config: &WorkgateConfig) -> Result<Self, WorkgateError> {
        Self::new(config.limiter.rate)
    }

    /// Block until a token is available and consume it
    ///
    /// Returns `Err(LimiterClosed)` once the generator has been closed and no
    /// buffered token remains.
    pub fn wait(&self) -> Result<(), WorkgateError> {
        self.tokens_rx
            .recv()
            .map_err(|_| WorkgateError::LimiterClosed)
    }

    /// Consume a token only if one is buffered right now
    pub fn try_wait(&self) -> bool {
        self.tokens_rx.try_recv().is_ok()
    }

    /// Stop the background generator; idempotent
    pub fn close(&self) {
        // Dropping the sender disconnects the shutdown channel
        if self.shutdown_tx.lock().take().is_none() {
            return;
        }

        if let Some(handle) = self.generator.lock().take()
            && handle.join().is_err()
        {
            tracing::warn!("Rate limiter generator thread panicked");
        }
        tracing::trace!("Rate limiter closed");
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.close();
    }
}

fn interval_for_rate(rate: i64) -> Result<Duration, WorkgateError> {
    if rate <= 0 || rate > u32::MAX as i64 {
        return Err(WorkgateError::InvalidRate(rate));
    }

    let interval = Duration::from_secs(1) / rate as u32;
    if interval.is_zero() {
        return Err(WorkgateError::InvalidRate(rate));
    }
    Ok(interval)
}

fn generate_tokens(interval: Duration, tokens_tx: Sender<()>, shutdown_rx: Receiver<()>) {
    let ticker = tick(interval);
    loop {
        select! {
            recv(shutdown_rx) -> _ => break,
            recv(ticker) -> _ => {
                // Full buffer means a token is already waiting; drop this tick
                let _ = tokens_tx.try_send(());
            }
        }
    }
}

/// Wait for a single token at `rate` ops/s, then run `f`
pub fn run_with_rate_limit<T, F>(rate: i64, f: F) -> Result<T, WorkgateError>
where
    F: FnOnce() -> T,
{
    let limiter = RateLimiter::new(rate)?;
    limiter.wait()?;
    let value = f();
    limiter.close();
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_from_config_uses_limiter_rate() {
        let mut config = WorkgateConfig::default();
        config.limiter.rate = 4;
        let limiter = RateLimiter::from_config(&config).unwrap();
        assert_eq!(limiter.interval(), Duration::from_millis(250));

        config.limiter.rate = 0;
        assert_eq!(
            RateLimiter::from_config(&config).unwrap_err(),
            WorkgateError::InvalidRate(0)
        );
    }

    #[test]
    fn test_invalid_rates_rejected() {
        assert_eq!(
            RateLimiter::new(0).unwrap_err(),
            WorkgateError::InvalidRate(0)
        );
        assert!(RateLimiter::new(-3).is_err());
        assert!(RateLimiter::new(2_000_000_000).is_err());
    }

    #[test]
    fn test_interval_from_rate() {
        let limiter = RateLimiter::new(4).unwrap();
        assert_eq!(limiter.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_try_wait_before_first_tick() {
        let limiter = RateLimiter::new(10).unwrap();
        assert!(!limiter.try_wait());
    }

    #[test]
    fn test_wait_spacing() {
        let limiter = RateLimiter::new(50).unwrap();
        let interval = limiter.interval();

        limiter.wait().unwrap();
        let mut last = Instant::now();
        for _ in 0..3 {
            limiter.wait().unwrap();
            let now = Instant::now();
            // Generous tolerance for scheduler jitter
            assert!(now.duration_since(last) >= interval / 2);
            last = now;
        }
    }

    #[test]
    fn test_no_burst_accumulation() {
        let limiter = RateLimiter::new(20).unwrap();
        // Three ticks elapse, but only one token can be buffered
        std::thread::sleep(Duration::from_millis(175));

        assert!(limiter.try_wait());
        assert!(!limiter.try_wait());
    }

    #[test]
    fn test_close_is_idempotent_and_wait_reports_closed() {
        let limiter = RateLimiter::new(1000).unwrap();
        limiter.close();
        limiter.close();

        // At most one token can still be buffered from before the close
        let _ = limiter.try_wait();
        assert_eq!(limiter.wait(), Err(WorkgateError::LimiterClosed));
    }

    #[test]
    fn test_run_with_rate_limit() {
        let value = run_with_rate_limit(100, || 21 * 2).unwrap();
        assert_eq!(value, 42);
        assert!(run_with_rate_limit(0, || ()).is_err());
    }
}
