//! Periodic removal of idle buckets.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use super::limiter::RateLimiter;

/// Background task that prunes a [`RateLimiter`] on a fixed interval.
#[derive(Debug)]
pub struct BucketSweeper {
    limiter: RateLimiter,
    interval: Duration,
}

impl BucketSweeper {
    /// Creates a sweeper for `limiter`.
    pub fn new(limiter: RateLimiter, interval: Duration) -> Self {
        Self { limiter, interval }
    }

    /// Runs the sweep loop until `cancel` flips to `true` or its sender is
    /// dropped.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Rate limit bucket sweeper started"
        );

        let mut interval = time::interval(self.interval);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = self.limiter.prune().await;
                    if removed > 0 {
                        tracing::debug!(removed, "Pruned idle rate limit buckets");
                    }
                }
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Rate limit bucket sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }
}
