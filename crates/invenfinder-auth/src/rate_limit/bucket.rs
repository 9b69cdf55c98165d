//! Single token bucket arithmetic.

use tokio::time::Instant;

use invenfinder_core::config::BucketPolicy;

/// Result of drawing one token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Whether the request may proceed.
    pub admitted: bool,
    /// Tokens left after this draw; may be negative.
    pub remaining: f64,
    /// Seconds until a retry could be admitted, set only on rejection.
    pub retry_after: Option<u64>,
}

/// A refillable token counter.
#[derive(Debug, Clone)]
pub struct Bucket {
    tokens: f64,
    modified: Instant,
}

impl Bucket {
    /// A new bucket holding the policy's initial tokens.
    pub fn new(policy: &BucketPolicy, now: Instant) -> Self {
        Self {
            tokens: policy.initial.clamp(policy.min, policy.max),
            modified: now,
        }
    }

    /// Current token count.
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Last refill instant.
    pub fn modified(&self) -> Instant {
        self.modified
    }

    /// Refills for the time elapsed since the last draw, then draws one
    /// token.
    ///
    /// The draw happens even when rejecting, down to `policy.min`, so a
    /// client that keeps hammering a drained bucket waits longer.
    pub fn take(&mut self, policy: &BucketPolicy, now: Instant) -> Decision {
        let elapsed_minutes = now.saturating_duration_since(self.modified).as_secs_f64() / 60.0;
        self.tokens = (self.tokens + elapsed_minutes * policy.rate).clamp(policy.min, policy.max);
        self.modified = now;

        let available = self.tokens;
        self.tokens = (self.tokens - 1.0).clamp(policy.min, policy.max);

        if available > 0.0 {
            return Decision {
                admitted: true,
                remaining: self.tokens,
                retry_after: None,
            };
        }

        let delay = ((1.0 - self.tokens) * 60.0 / policy.rate).ceil();
        Decision {
            admitted: false,
            remaining: self.tokens,
            retry_after: Some((delay as u64).max(1)),
        }
    }
}
