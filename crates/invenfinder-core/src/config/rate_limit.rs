//! Token bucket configuration.

use serde::{Deserialize, Serialize};

/// Refill and bound parameters for one class of token buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketPolicy {
    /// Tokens regained per minute.
    pub rate: f64,
    /// Tokens in a freshly created bucket.
    pub initial: f64,
    /// Upper clamp.
    pub max: f64,
    /// Lower clamp; negative values make a hammering client wait longer.
    pub min: f64,
}

impl Default for BucketPolicy {
    fn default() -> Self {
        Self {
            rate: 100.0,
            initial: 50.0,
            max: 100.0,
            min: -10.0,
        }
    }
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Seconds between stale-bucket sweeps.
    #[serde(default = "default_prune_interval")]
    pub prune_interval_seconds: u64,
    /// Buckets untouched for this many minutes are dropped by the sweep.
    #[serde(default = "default_max_age")]
    pub max_age_minutes: u64,
    /// Policy applied to every API request, keyed by client IP.
    #[serde(default)]
    pub default: BucketPolicy,
    /// Policy for credential submission (login and registration).
    #[serde(default = "default_login_policy")]
    pub login: BucketPolicy,
    /// Policy for session management, keyed by session id.
    #[serde(default)]
    pub user: BucketPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            prune_interval_seconds: default_prune_interval(),
            max_age_minutes: default_max_age(),
            default: BucketPolicy::default(),
            login: default_login_policy(),
            user: BucketPolicy::default(),
        }
    }
}

fn default_prune_interval() -> u64 {
    60
}

fn default_max_age() -> u64 {
    60
}

fn default_login_policy() -> BucketPolicy {
    BucketPolicy {
        rate: 10.0,
        initial: 10.0,
        max: 10.0,
        min: -5.0,
    }
}
