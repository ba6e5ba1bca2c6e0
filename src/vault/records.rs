//! Sealing documents into `EncryptedRecord`s and opening them again.
//!
//! Bulk operations run on the rayon pool.  Results come back in input
//! order, so listings keep insertion order.

use rayon::prelude::*;
use tracing::warn;
use zeroize::Zeroizing;

use super::document::SecretDocument;
use crate::crypto::DocumentCipher;
use crate::errors::{Result, VaultError};
use crate::storage::EncryptedRecord;

/// Serialize and encrypt one document under `secret`.
pub fn seal(cipher: &DocumentCipher, doc: &SecretDocument, secret: &str) -> Result<EncryptedRecord> {
    let json = Zeroizing::new(
        serde_json::to_string(doc).map_err(|e| VaultError::SerializationError(e.to_string()))?,
    );
    Ok(EncryptedRecord {
        id: doc.id.clone(),
        encoded_ciphertext: cipher.encrypt(&json, secret)?,
    })
}

/// Decrypt and parse one record.
///
/// A record whose JSON does not parse is a `Format` error, the same as a
/// malformed ciphertext string.
pub fn open(cipher: &DocumentCipher, record: &EncryptedRecord, secret: &str) -> Result<SecretDocument> {
    let json = cipher.decrypt(&record.encoded_ciphertext, secret)?;
    let mut doc: SecretDocument = serde_json::from_str(&json)
        .map_err(|e| VaultError::Format(format!("record '{}': {e}", record.id)))?;
    // The record id is authoritative over whatever the payload claims.
    doc.id.clone_from(&record.id);
    Ok(doc)
}

/// Open every record concurrently, dropping (and logging) the ones that
/// fail so one bad record never hides the rest of the vault.
pub fn open_all(
    cipher: &DocumentCipher,
    records: &[EncryptedRecord],
    secret: &str,
) -> Vec<SecretDocument> {
    records
        .par_iter()
        .filter_map(|record| match open(cipher, record, secret) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(id = %record.id, error = %e, "dropping record that failed to decrypt");
                None
            }
        })
        .collect()
}

/// Seal every document concurrently.  Fails if any single one fails.
pub fn seal_all(
    cipher: &DocumentCipher,
    docs: &[SecretDocument],
    secret: &str,
) -> Result<Vec<EncryptedRecord>> {
    docs.par_iter().map(|doc| seal(cipher, doc, secret)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Pbkdf2Params;
    use crate::vault::document::NewDocument;
    use chrono::Utc;

    fn cipher() -> DocumentCipher {
        DocumentCipher::new(Pbkdf2Params { iterations: 1_000 })
    }

    fn doc(title: &str) -> SecretDocument {
        NewDocument::titled(title).into_document(Utc::now())
    }

    #[test]
    fn seal_then_open() {
        let c = cipher();
        let d = doc("A");
        let record = seal(&c, &d, "123456").unwrap();
        assert_eq!(record.id, d.id);
        assert!(!record.encoded_ciphertext.contains("\"title\""));
        assert_eq!(open(&c, &record, "123456").unwrap(), d);
    }

    #[test]
    fn open_with_wrong_secret_is_authentication() {
        let c = cipher();
        let record = seal(&c, &doc("A"), "123456").unwrap();
        assert!(matches!(
            open(&c, &record, "654321"),
            Err(VaultError::Authentication)
        ));
    }

    #[test]
    fn open_all_drops_bad_records_and_keeps_order() {
        let c = cipher();
        let docs = vec![doc("A"), doc("B"), doc("C")];
        let mut records = seal_all(&c, &docs, "123456").unwrap();
        records[1].encoded_ciphertext = "garbage".into();

        let opened = open_all(&c, &records, "123456");
        let titles: Vec<_> = opened.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[test]
    fn record_id_wins_over_payload_id() {
        let c = cipher();
        let mut record = seal(&c, &doc("A"), "123456").unwrap();
        record.id = "secret_1_renamed00".into();
        assert_eq!(open(&c, &record, "123456").unwrap().id, "secret_1_renamed00");
    }
}
