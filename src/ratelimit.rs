//! Process-wide spacing of generative-backend calls.
//!
//! Free-tier vision APIs enforce per-minute quotas. Rather than an ambient
//! static "last request time", the limiter is an explicit object owning a
//! mutex-guarded timestamp, injected into the orchestrator. One `Arc` is
//! shared by every component that talks to the backend, so calls from
//! concurrent uploads in the same process are still spaced by the minimum
//! interval.
//!
//! The mutex is held across the sleep on purpose: if two tasks call
//! [`RateLimiter::acquire`] simultaneously, the second must wait for the
//! first's slot *and* its own interval, serialising call-starts rather than
//! releasing them in a burst after a shared wait.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Enforces a minimum interval between call-starts, process-wide when
/// shared via `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter spacing call-starts by `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Block until at least `min_interval` has elapsed since the previous
    /// acquisition, then claim the current instant as the new call-start.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("rate limiter: sleeping {:?} before next backend call", wait);
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// The configured minimum spacing.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn spaces_consecutive_calls() {
        let limiter = RateLimiter::new(Duration::from_secs(3));

        limiter.acquire().await;
        let first = Instant::now();
        limiter.acquire().await;
        let second = Instant::now();

        assert!(second - first >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn serialises_concurrent_callers() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(2)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let l = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                l.acquire().await;
                Instant::now() - start
            }));
        }

        let mut offsets: Vec<Duration> = Vec::new();
        for h in handles {
            offsets.push(h.await.unwrap());
        }
        offsets.sort();

        // Three callers, two-second spacing: starts at 0s, 2s, 4s.
        assert!(offsets[1] - offsets[0] >= Duration::from_secs(2));
        assert!(offsets[2] - offsets[1] >= Duration::from_secs(2));
    }
}
