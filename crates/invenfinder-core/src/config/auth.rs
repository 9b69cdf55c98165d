//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Credential hashing and password policy configuration.
///
/// The Argon2id defaults follow the OWASP baseline (19 MiB, 2 passes,
/// 1 lane).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Minimum password length. The default only rejects empty passwords.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_memory")]
    pub hash_memory_kib: u32,
    /// Argon2 pass count.
    #[serde(default = "default_iterations")]
    pub hash_iterations: u32,
    /// Argon2 lane count.
    #[serde(default = "default_parallelism")]
    pub hash_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_min_length: default_password_min(),
            hash_memory_kib: default_memory(),
            hash_iterations: default_iterations(),
            hash_parallelism: default_parallelism(),
        }
    }
}

fn default_password_min() -> usize {
    1
}

fn default_memory() -> u32 {
    19_456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}
