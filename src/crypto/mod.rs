//! Cryptographic primitives for DocVault.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation (`kdf`)
//! - AES-256-GCM encryption into the `salt:iv:ciphertext` format (`encryption`)
//! - Salted SHA-256 hashing and constant-time verification of secrets (`hash`)

pub mod encryption;
pub mod hash;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, hash_secret, ...};
pub use encryption::{decrypt, encrypt, DocumentCipher};
pub use hash::{generate_temp_pin, hash_secret, verify_secret};
pub use kdf::{derive_key, derive_key_with_params, generate_salt, Pbkdf2Params};
