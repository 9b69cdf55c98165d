//! Session management configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long an SSO-backed session is trusted before the identity
    /// provider is asked again.
    #[serde(default = "default_revalidation_interval")]
    pub revalidation_interval_minutes: u64,
}

impl SessionConfig {
    /// The revalidation interval as a `Duration`.
    pub fn revalidation_interval(&self) -> Duration {
        Duration::from_secs(self.revalidation_interval_minutes * 60)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            revalidation_interval_minutes: default_revalidation_interval(),
        }
    }
}

fn default_revalidation_interval() -> u64 {
    10
}
