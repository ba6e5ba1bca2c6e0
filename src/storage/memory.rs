//! In-memory backend.
//!
//! Keeps records in insertion order.  The `offline` switch makes every
//! call fail with `Persistence`, which is how tests stand in for an
//! unreachable remote.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::{EncryptedRecord, IdSet, PersistenceBackend};
use crate::errors::{Result, VaultError};
use crate::vault::VaultSettings;

#[derive(Debug, Default, Clone)]
struct ScopeData {
    credential: Option<String>,
    legacy_blob: Option<String>,
    records: Vec<EncryptedRecord>,
    tombstones: IdSet,
    cleanup_queue: IdSet,
    settings: Option<VaultSettings>,
    unsynced_keys: IdSet,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    scopes: Mutex<HashMap<String, ScopeData>>,
    offline: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend becoming (un)reachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.is_offline() {
            return Err(VaultError::Persistence("memory backend is offline".into()));
        }
        Ok(())
    }

    fn read<T>(&self, user: &str, f: impl FnOnce(&ScopeData) -> T) -> Result<T> {
        self.check_online()?;
        let scopes = self.scopes.lock();
        Ok(match scopes.get(user) {
            Some(data) => f(data),
            None => f(&ScopeData::default()),
        })
    }

    fn write(&self, user: &str, f: impl FnOnce(&mut ScopeData)) -> Result<()> {
        self.check_online()?;
        let mut scopes = self.scopes.lock();
        f(scopes.entry(user.to_string()).or_default());
        Ok(())
    }
}

impl PersistenceBackend for MemoryBackend {
    fn get_credential(&self, user: &str) -> Result<Option<String>> {
        self.read(user, |d| d.credential.clone())
    }

    fn set_credential(&self, user: &str, hash: Option<&str>) -> Result<()> {
        self.write(user, |d| d.credential = hash.map(str::to_string))
    }

    fn get_legacy_blob(&self, user: &str) -> Result<Option<String>> {
        self.read(user, |d| d.legacy_blob.clone())
    }

    fn set_legacy_blob(&self, user: &str, blob: &str) -> Result<()> {
        self.write(user, |d| d.legacy_blob = Some(blob.to_string()))
    }

    fn list_records(&self, user: &str) -> Result<Vec<EncryptedRecord>> {
        self.read(user, |d| d.records.clone())
    }

    fn upsert_records(&self, user: &str, records: &[EncryptedRecord]) -> Result<()> {
        self.write(user, |d| {
            for record in records {
                match d.records.iter_mut().find(|r| r.id == record.id) {
                    Some(existing) => *existing = record.clone(),
                    None => d.records.push(record.clone()),
                }
            }
        })
    }

    fn delete_records(&self, user: &str, ids: &[String]) -> Result<()> {
        self.write(user, |d| d.records.retain(|r| !ids.contains(&r.id)))
    }

    fn get_tombstones(&self, user: &str) -> Result<IdSet> {
        self.read(user, |d| d.tombstones.clone())
    }

    fn set_tombstones(&self, user: &str, ids: &IdSet) -> Result<()> {
        self.write(user, |d| d.tombstones = ids.clone())
    }

    fn get_cleanup_queue(&self, user: &str) -> Result<IdSet> {
        self.read(user, |d| d.cleanup_queue.clone())
    }

    fn set_cleanup_queue(&self, user: &str, ids: &IdSet) -> Result<()> {
        self.write(user, |d| d.cleanup_queue = ids.clone())
    }

    fn get_settings(&self, user: &str) -> Result<Option<VaultSettings>> {
        self.read(user, |d| d.settings.clone())
    }

    fn set_settings(&self, user: &str, settings: &VaultSettings) -> Result<()> {
        self.write(user, |d| d.settings = Some(settings.clone()))
    }

    fn get_unsynced_keys(&self, user: &str) -> Result<IdSet> {
        self.read(user, |d| d.unsynced_keys.clone())
    }

    fn set_unsynced_keys(&self, user: &str, keys: &IdSet) -> Result<()> {
        self.write(user, |d| d.unsynced_keys = keys.clone())
    }
}
