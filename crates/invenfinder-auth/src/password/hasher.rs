//! Salted Argon2id password hashing and verification.
//!
//! Users store a random 32-byte salt and a 32-byte raw digest, both
//! base64-encoded, rather than a PHC string.

use argon2::password_hash::Output;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use invenfinder_core::config::AuthConfig;
use invenfinder_core::error::AppError;
use invenfinder_core::result::AppResult;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// Base64-encoded salt and digest, ready to store on a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    /// Base64 salt.
    pub salt: String,
    /// Base64 digest.
    pub hash: String,
}

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Creates a hasher with the configured work factors.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let params = Params::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
            Some(DIGEST_LEN),
        )
        .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    /// Draws a fresh salt from the OS CSPRNG.
    pub fn new_salt(&self) -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        salt
    }

    /// Derives the digest of `password` under `salt`.
    pub fn hash(&self, password: &str, salt: &[u8]) -> AppResult<[u8; DIGEST_LEN]> {
        let mut digest = [0u8; DIGEST_LEN];
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
            .hash_password_into(password.as_bytes(), salt, &mut digest)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
        Ok(digest)
    }

    /// Recomputes the digest and compares it in constant time.
    pub fn verify(&self, password: &str, salt: &[u8], digest: &[u8]) -> AppResult<bool> {
        let expected = Output::new(digest)
            .map_err(|e| AppError::internal(format!("Stored password digest is invalid: {e}")))?;
        let computed = self.hash(password, salt)?;
        let computed = Output::new(&computed)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        // Output's equality is constant-time
        Ok(computed == expected)
    }

    /// Hashes `password` under a fresh salt and encodes both for storage.
    pub fn hash_new(&self, password: &str) -> AppResult<StoredCredentials> {
        let salt = self.new_salt();
        let digest = self.hash(password, &salt)?;
        Ok(StoredCredentials {
            salt: STANDARD.encode(salt),
            hash: STANDARD.encode(digest),
        })
    }

    /// Verifies `password` against base64-encoded stored credentials.
    pub fn verify_stored(&self, password: &str, salt: &str, hash: &str) -> AppResult<bool> {
        let salt = STANDARD
            .decode(salt)
            .map_err(|e| AppError::internal(format!("Stored password salt is invalid: {e}")))?;
        let digest = STANDARD
            .decode(hash)
            .map_err(|e| AppError::internal(format!("Stored password digest is invalid: {e}")))?;
        self.verify(password, &salt, &digest)
    }

    /// Credentials for a random password nobody knows, for accounts that
    /// only ever sign in through an identity provider.
    pub fn unusable(&self) -> AppResult<StoredCredentials> {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        let password = STANDARD.encode(secret);
        self.hash_new(&password)
    }
}
