//! Salted SHA-256 hashing of PINs and document passwords.
//!
//! Stored form: `base64(salt[16]):base64(sha256(salt || secret))`.
//! Verification recomputes the digest with the stored salt and compares
//! in constant time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::kdf::{generate_salt, SALT_LEN};

/// Hash `secret` with a fresh random salt.
pub fn hash_secret(secret: &str) -> String {
    let salt = generate_salt();
    let digest = salted_digest(&salt, secret);
    format!("{}:{}", BASE64.encode(salt), BASE64.encode(digest))
}

/// Check `secret` against a `salt:hash` string produced by `hash_secret`.
///
/// A malformed stored hash never verifies.
pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    let Some((salt_b64, hash_b64)) = stored_hash.split_once(':') else {
        tracing::debug!("stored hash is missing its ':' separator");
        return false;
    };

    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt_b64), BASE64.decode(hash_b64)) else {
        tracing::debug!("stored hash is not valid base64");
        return false;
    };

    if salt.len() != SALT_LEN {
        return false;
    }

    let actual = salted_digest(&salt, secret);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

/// Generate a random 6-digit temporary PIN for the out-of-band reset flow.
pub fn generate_temp_pin() -> String {
    rand::rng().random_range(100_000..1_000_000u32).to_string()
}

fn salted_digest(salt: &[u8], secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}
