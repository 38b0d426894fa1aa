use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

/// Fixed-window request counter.
///
/// Allows `quota` acquisitions per window; the next one suspends until the
/// window ends, then starts a fresh window. Bursts straddling a window
/// boundary can briefly reach twice the quota.
#[derive(Debug)]
pub struct RateLimiter {
    quota: u32,
    window: Duration,
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            quota: quota.max(1),
            window,
            count: 0,
            window_start: Instant::now(),
        }
    }

    /// Take one request slot, waiting for the window to reset if needed.
    /// Returns how long the caller was suspended.
    pub async fn acquire(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= self.window {
            self.start_window(now);
        }

        let mut waited = Duration::ZERO;
        if self.count >= self.quota {
            waited = self.window.saturating_sub(elapsed.min(self.window));
            info!(wait_ms = waited.as_millis() as u64, "geocoding quota reached, waiting for window reset");
            tokio::time::sleep(waited).await;
            self.start_window(Instant::now());
        }

        self.count += 1;
        waited
    }

    /// Mark the current window as used up, e.g. after the provider signalled throttling.
    pub fn saturate(&mut self) {
        self.count = self.quota;
    }

    /// Forget all accounting and open a fresh window now.
    pub fn reset(&mut self) {
        self.start_window(Instant::now());
    }

    /// Requests taken in the current window.
    pub fn used(&self) -> u32 {
        self.count
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    fn start_window(&mut self, at: Instant) {
        self.count = 0;
        self.window_start = at;
    }
}
