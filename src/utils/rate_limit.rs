use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shared fetch gate: no fetch is issued anywhere in the process without
/// acquiring a slot here first. Passed around as an `Arc`, never a global.
pub struct RateLimiter {
    min_interval: Duration,
    last_release: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_release: Mutex::new(None),
        }
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// acquisition, then claims the slot.
    pub async fn acquire(&self) {
        let mut last = self.last_release.lock().await;
        let now = Instant::now();

        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            if ready_at > now {
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spaces_out_acquisitions() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
