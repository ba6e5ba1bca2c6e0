//! AES-256-GCM authenticated encryption of document payloads.
//!
//! Every call to `encrypt` draws a fresh 16-byte salt and 12-byte IV,
//! derives a key from the secret with PBKDF2, and returns a single
//! newline-free string:
//!
//! ```text
//! base64(salt[16]):base64(iv[12]):base64(ciphertext || tag[16])
//! ```
//!
//! `decrypt` reverses this.  A malformed string is a `Format` error; a
//! GCM tag mismatch (wrong secret or tampered data) is `Authentication`.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::{Zeroize, Zeroizing};

use super::kdf::{derive_key_with_params, generate_salt, Pbkdf2Params, SALT_LEN};
use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const IV_LEN: usize = 12;

/// Separator between the three base64 components.
const SEPARATOR: char = ':';

/// Encrypts and decrypts opaque payloads under a low-entropy secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCipher {
    params: Pbkdf2Params,
}

impl DocumentCipher {
    pub fn new(params: Pbkdf2Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Pbkdf2Params {
        &self.params
    }

    /// Encrypt `plaintext` under `secret`.
    pub fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String> {
        let salt = generate_salt();
        let mut key = derive_key_with_params(secret.as_bytes(), &salt, &self.params)?;

        let cipher = Aes256Gcm::new_from_slice(&key);
        key.zeroize();
        let cipher = cipher
            .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

        let iv = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&iv, plaintext.as_bytes())
            .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

        Ok(format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            BASE64.encode(salt),
            BASE64.encode(iv),
            BASE64.encode(ciphertext)
        ))
    }

    /// Decrypt a string produced by `encrypt`.
    pub fn decrypt(&self, encoded: &str, secret: &str) -> Result<Zeroizing<String>> {
        let (salt, iv, ciphertext) = split_encoded(encoded)?;

        let mut key = derive_key_with_params(secret.as_bytes(), &salt, &self.params)?;
        let cipher = Aes256Gcm::new_from_slice(&key);
        key.zeroize();
        let cipher = cipher.map_err(|_| VaultError::Authentication)?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
            .map_err(|_| VaultError::Authentication)?;

        String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            VaultError::Format("decrypted payload is not valid UTF-8".into())
        })
    }
}

/// Encrypt with the default PBKDF2 parameters.
pub fn encrypt(plaintext: &str, secret: &str) -> Result<String> {
    DocumentCipher::default().encrypt(plaintext, secret)
}

/// Decrypt with the default PBKDF2 parameters.
pub fn decrypt(encoded: &str, secret: &str) -> Result<Zeroizing<String>> {
    DocumentCipher::default().decrypt(encoded, secret)
}

/// Split and decode `salt:iv:ciphertext`, checking component sizes.
fn split_encoded(encoded: &str) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    let parts: Vec<&str> = encoded.split(SEPARATOR).collect();
    let [salt_b64, iv_b64, ct_b64] = parts.as_slice() else {
        return Err(VaultError::Format(format!(
            "expected 3 ':'-separated parts, found {}",
            parts.len()
        )));
    };

    let decode = |label: &str, value: &str| {
        BASE64
            .decode(value)
            .map_err(|e| VaultError::Format(format!("{label} is not valid base64: {e}")))
    };

    let salt = decode("salt", *salt_b64)?;
    let iv = decode("iv", *iv_b64)?;
    let ciphertext = decode("ciphertext", *ct_b64)?;

    if salt.len() != SALT_LEN {
        return Err(VaultError::Format(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }
    if iv.len() != IV_LEN {
        return Err(VaultError::Format(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    if ciphertext.is_empty() {
        return Err(VaultError::Format("ciphertext is empty".into()));
    }

    Ok((salt, iv, ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> DocumentCipher {
        DocumentCipher::new(Pbkdf2Params { iterations: 1_000 })
    }

    #[test]
    fn roundtrip() {
        let c = fast();
        let encoded = c.encrypt("hello vault", "123456").unwrap();
        assert_eq!(c.decrypt(&encoded, "123456").unwrap().as_str(), "hello vault");
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let c = fast();
        let encoded = c.encrypt("", "123456").unwrap();
        assert_eq!(c.decrypt(&encoded, "123456").unwrap().as_str(), "");
    }

    #[test]
    fn encoded_has_three_parts_and_no_newlines() {
        let encoded = fast().encrypt("x", "1234").unwrap();
        assert_eq!(encoded.split(':').count(), 3);
        assert!(!encoded.contains('\n'));
    }

    #[test]
    fn wrong_secret_is_authentication_error() {
        let c = fast();
        let encoded = c.encrypt("data", "111111").unwrap();
        assert!(matches!(
            c.decrypt(&encoded, "222222"),
            Err(VaultError::Authentication)
        ));
    }

    #[test]
    fn two_parts_is_format_error() {
        assert!(matches!(
            fast().decrypt("abc:def", "1"),
            Err(VaultError::Format(_))
        ));
    }

    #[test]
    fn four_parts_is_format_error() {
        assert!(matches!(
            fast().decrypt("a:b:c:d", "1"),
            Err(VaultError::Format(_))
        ));
    }

    #[test]
    fn bad_base64_is_format_error() {
        assert!(matches!(
            fast().decrypt("!!!:???:***", "1"),
            Err(VaultError::Format(_))
        ));
    }

    #[test]
    fn short_iv_is_format_error() {
        let salt = BASE64.encode([0u8; SALT_LEN]);
        let iv = BASE64.encode([0u8; 8]);
        let ct = BASE64.encode([0u8; 32]);
        let encoded = format!("{salt}:{iv}:{ct}");
        assert!(matches!(
            fast().decrypt(&encoded, "1"),
            Err(VaultError::Format(_))
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let c = fast();
        let encoded = c.encrypt("payload", "654321").unwrap();
        let mut parts: Vec<String> = encoded.split(':').map(String::from).collect();
        let mut ct = BASE64.decode(&parts[2]).unwrap();
        ct[0] ^= 0xFF;
        parts[2] = BASE64.encode(ct);

        assert!(matches!(
            c.decrypt(&parts.join(":"), "654321"),
            Err(VaultError::Authentication)
        ));
    }
}
