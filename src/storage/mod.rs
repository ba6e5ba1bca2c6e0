//! Persistence backends: where ciphertext, credentials and id sets live.
//!
//! This module provides:
//! - The `PersistenceBackend` trait every store implements
//! - An in-memory backend for tests and embedding (`memory`)
//! - An on-device, one-file-per-record backend (`file`)
//! - `TieredStore`, which routes between a remote and the device store (`tiered`)
//!
//! Every call is scoped by a user identifier.  The device store uses the
//! same shapes as any remote, so local-only vaults just use `LOCAL_SCOPE`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::vault::VaultSettings;

pub mod file;
pub mod memory;
pub mod tiered;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use tiered::TieredStore;

/// Scope used when no user is signed in.
pub const LOCAL_SCOPE: &str = "local";

/// A set of document ids (tombstones or the cleanup queue).
pub type IdSet = BTreeSet<String>;

/// One document's ciphertext as stored by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    pub id: String,
    /// `base64(salt):base64(iv):base64(ciphertext)`
    pub encoded_ciphertext: String,
}

/// Key/value operations the vault needs from a storage backend.
///
/// Implementations report an unreachable store as
/// `VaultError::Persistence`.  Getters on keys that were never written
/// return `None` or an empty collection, not an error.
pub trait PersistenceBackend: Send + Sync {
    fn get_credential(&self, user: &str) -> Result<Option<String>>;
    /// `None` removes the credential.
    fn set_credential(&self, user: &str, hash: Option<&str>) -> Result<()>;

    fn get_legacy_blob(&self, user: &str) -> Result<Option<String>>;
    fn set_legacy_blob(&self, user: &str, blob: &str) -> Result<()>;

    /// All records in insertion order.  Stores that cannot keep that
    /// order list by id, which starts with the creation time.
    fn list_records(&self, user: &str) -> Result<Vec<EncryptedRecord>>;
    /// Insert new records or replace existing ones with the same id.
    fn upsert_records(&self, user: &str, records: &[EncryptedRecord]) -> Result<()>;
    /// Remove records by id.  Unknown ids are ignored.
    fn delete_records(&self, user: &str, ids: &[String]) -> Result<()>;

    fn get_tombstones(&self, user: &str) -> Result<IdSet>;
    fn set_tombstones(&self, user: &str, ids: &IdSet) -> Result<()>;

    fn get_cleanup_queue(&self, user: &str) -> Result<IdSet>;
    fn set_cleanup_queue(&self, user: &str, ids: &IdSet) -> Result<()>;

    fn get_settings(&self, user: &str) -> Result<Option<VaultSettings>>;
    fn set_settings(&self, user: &str, settings: &VaultSettings) -> Result<()>;

    /// Keys written to this store while the remote tier was unreachable.
    /// Only `TieredStore` reads or writes these, and only on the device
    /// store.
    fn get_unsynced_keys(&self, user: &str) -> Result<IdSet>;
    fn set_unsynced_keys(&self, user: &str, keys: &IdSet) -> Result<()>;
}
