//! The legacy single-blob layout.
//!
//! Before per-document records, a vault was one ciphertext holding the
//! JSON array of every document.  That blob is read once, split into
//! records, and kept until a later record write retires it.

use tracing::info;
use zeroize::Zeroizing;

use super::document::SecretDocument;
use crate::crypto::DocumentCipher;
use crate::errors::{Result, VaultError};

/// What `VaultRepository::migrate_legacy` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No blob, or an empty one.
    NoLegacyData,
    /// Records already exist; the blob (if any) was left alone.
    AlreadyMigrated,
    /// The blob was split into this many records.
    Migrated(usize),
}

/// Whether a stored blob value holds any documents at all.
pub fn is_blank(blob: &str) -> bool {
    let trimmed = blob.trim();
    trimmed.is_empty() || trimmed == "[]"
}

/// Decrypt a legacy blob into its documents.
pub fn decode_blob(cipher: &DocumentCipher, blob: &str, secret: &str) -> Result<Vec<SecretDocument>> {
    let json = cipher.decrypt(blob, secret)?;
    let docs: Vec<SecretDocument> = serde_json::from_str(&json)
        .map_err(|e| VaultError::Format(format!("legacy blob: {e}")))?;
    info!(count = docs.len(), "decoded legacy document blob");
    Ok(docs)
}

/// Encrypt documents back into the legacy blob shape.
///
/// Only used to keep the blob consistent while it is still the sole
/// copy of the vault.
pub fn encode_blob(cipher: &DocumentCipher, docs: &[SecretDocument], secret: &str) -> Result<String> {
    let json = Zeroizing::new(
        serde_json::to_string(docs).map_err(|e| VaultError::SerializationError(e.to_string()))?,
    );
    cipher.encrypt(&json, secret)
}
