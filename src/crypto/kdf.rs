//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! A PIN or document password plus a 16-byte salt is stretched into a
//! 256-bit AES key.  The salt is stored next to the ciphertext, so the
//! same key can be rebuilt later from the same secret.
//!
//! There is no error for a wrong secret here: it simply yields a
//! different key, and the mistake surfaces at the GCM tag check.

use hmac::Hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::errors::{Result, VaultError};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Minimum accepted iteration count.
const MIN_ITERATIONS: u32 = 1_000;

/// Configurable PBKDF2 parameters.
///
/// The iteration count is not recorded in the ciphertext, so it must
/// stay the same for the whole lifetime of a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2Params {
    /// Number of HMAC-SHA256 rounds (default: 100 000).
    pub iterations: u32,
}

impl Default for Pbkdf2Params {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Derive a 32-byte key from a secret and salt with the default params.
pub fn derive_key(secret: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN]> {
    derive_key_with_params(secret, salt, &Pbkdf2Params::default())
}

/// Derive a 32-byte key with explicit PBKDF2 parameters.
///
/// The same secret + salt + params always produce the same key.
pub fn derive_key_with_params(
    secret: &[u8],
    salt: &[u8],
    params: &Pbkdf2Params,
) -> Result<[u8; KEY_LEN]> {
    if params.iterations < MIN_ITERATIONS {
        return Err(VaultError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {})",
            params.iterations
        )));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(secret, salt, params.iterations, &mut key)
        .map_err(|e| VaultError::KeyDerivationFailed(format!("PBKDF2 failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
