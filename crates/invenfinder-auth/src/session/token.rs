//! Opaque session token generation.

use argon2::password_hash::rand_core::{OsRng, RngCore};

/// Token length in bytes before hex encoding.
pub const TOKEN_BYTES: usize = 32;

/// Generates a 64-character lowercase hex token from the OS CSPRNG.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
