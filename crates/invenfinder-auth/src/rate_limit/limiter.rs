//! In-process token bucket registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use invenfinder_core::config::{BucketPolicy, RateLimitConfig};
use invenfinder_core::error::AppError;
use invenfinder_core::result::AppResult;

use super::bucket::{Bucket, Decision};

/// Bucket id used when a client cannot be identified.
pub const UNKNOWN_CLIENT: &str = "null";

/// Builds the `tag:clientID` bucket key. A missing id maps to `null`.
///
/// Empty ids and ids containing control characters are rejected rather than
/// collapsed into a shared bucket.
pub fn bucket_key(tag: &str, client_id: Option<&str>) -> AppResult<String> {
    let id = client_id.unwrap_or(UNKNOWN_CLIENT);
    if id.is_empty() || id.chars().any(char::is_control) {
        return Err(AppError::internal(format!(
            "Malformed rate limiting id for tag '{tag}'"
        )));
    }
    Ok(format!("{tag}:{id}"))
}

/// Token buckets keyed by `tag:clientID`.
///
/// Refill, draw and prune all happen under one lock, so operations on the
/// same key are serialized.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    max_age: Duration,
}

impl RateLimiter {
    /// Creates a limiter whose buckets expire after the configured max age.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_max_age(Duration::from_secs(config.max_age_minutes * 60))
    }

    /// Creates a limiter with an explicit bucket max age.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            max_age,
        }
    }

    /// Draws one token from the bucket at `key`, creating it on first use.
    pub async fn check(&self, key: &str, policy: &BucketPolicy) -> AppResult<Decision> {
        validate_policy(policy)?;

        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(policy, now));

        Ok(bucket.take(policy, now))
    }

    /// Drops buckets untouched for longer than the max age. Returns the
    /// number removed.
    pub async fn prune(&self) -> usize {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.modified()) <= self.max_age);
        before - buckets.len()
    }

    /// Number of live buckets.
    pub async fn len(&self) -> usize {
        self.buckets.lock().await.len()
    }

    /// Whether no buckets are live.
    pub async fn is_empty(&self) -> bool {
        self.buckets.lock().await.is_empty()
    }
}

fn validate_policy(policy: &BucketPolicy) -> AppResult<()> {
    let finite = [policy.rate, policy.initial, policy.max, policy.min]
        .iter()
        .all(|v| v.is_finite());
    if !finite || policy.rate <= 0.0 || policy.min > policy.max {
        return Err(AppError::internal(format!(
            "Invalid rate limit policy: {policy:?}"
        )));
    }
    Ok(())
}
