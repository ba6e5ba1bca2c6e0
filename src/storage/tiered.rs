//! Routing between a remote backend and the on-device store.
//!
//! - **Local-only** (no remote): every call goes to the device store and
//!   its errors propagate unchanged.
//! - **Connected**: the remote is the source of truth and the device store
//!   mirrors it.  Writes go to the remote first and are then copied to the
//!   device.  If the remote fails with `Persistence`, the write lands on
//!   the device alone and its key is recorded as unsynced.  Unsynced keys
//!   win over the remote on every read until they are pushed, which
//!   happens at the start of the next call that finds the remote
//!   reachable.  Reads of synced keys prefer the remote and fall back to
//!   the device mirror when it is unreachable.  Deletes apply to both
//!   tiers; a failed remote delete is still reported, since there is no
//!   fallback for it.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{EncryptedRecord, IdSet, PersistenceBackend};
use crate::errors::{Result, VaultError};
use crate::vault::VaultSettings;

const CREDENTIAL_KEY: &str = "credential";
const LEGACY_BLOB_KEY: &str = "legacy-blob";
const TOMBSTONES_KEY: &str = "tombstones";
const CLEANUP_QUEUE_KEY: &str = "cleanup-queue";
const SETTINGS_KEY: &str = "settings";
const RECORD_KEY_PREFIX: &str = "record:";

fn record_key(id: &str) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}

pub struct TieredStore {
    remote: Option<Arc<dyn PersistenceBackend>>,
    local: Arc<dyn PersistenceBackend>,
    /// Serializes changes to the device's unsynced-key set.
    sync_lock: Mutex<()>,
}

impl TieredStore {
    /// Device store only; used when no user is signed in.
    pub fn local_only(local: Arc<dyn PersistenceBackend>) -> Self {
        Self {
            remote: None,
            local,
            sync_lock: Mutex::new(()),
        }
    }

    /// Remote store with the device store as mirror and fallback.
    pub fn connected(
        remote: Arc<dyn PersistenceBackend>,
        local: Arc<dyn PersistenceBackend>,
    ) -> Self {
        Self {
            remote: Some(remote),
            local,
            sync_lock: Mutex::new(()),
        }
    }

    pub fn is_local_only(&self) -> bool {
        self.remote.is_none()
    }

    // ------------------------------------------------------------------
    // Unsynced device writes
    // ------------------------------------------------------------------

    /// Push every unsynced device value to the remote and return the keys
    /// that are still unsynced.  An unreachable remote leaves them all in
    /// place; pushing again later is harmless since whole values are sent.
    fn flush(&self, remote: &dyn PersistenceBackend, user: &str) -> IdSet {
        let _guard = self.sync_lock.lock();
        let pending = match self.local.get_unsynced_keys(user) {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "could not read unsynced keys from device store");
                return IdSet::new();
            }
        };
        if pending.is_empty() {
            return pending;
        }

        if let Err(e) = self.push(remote, user, &pending) {
            debug!(error = %e, "remote still unreachable; keeping device changes");
            return pending;
        }
        info!(count = pending.len(), "pushed device changes to remote");

        match self.local.set_unsynced_keys(user, &IdSet::new()) {
            Ok(()) => IdSet::new(),
            Err(e) => {
                warn!(error = %e, "could not clear unsynced keys after pushing them");
                pending
            }
        }
    }

    fn push(&self, remote: &dyn PersistenceBackend, user: &str, keys: &IdSet) -> Result<()> {
        let mut record_ids = HashSet::new();
        for key in keys {
            if let Some(id) = key.strip_prefix(RECORD_KEY_PREFIX) {
                record_ids.insert(id);
                continue;
            }
            match key.as_str() {
                CREDENTIAL_KEY => {
                    remote.set_credential(user, self.local.get_credential(user)?.as_deref())?
                }
                LEGACY_BLOB_KEY => {
                    if let Some(blob) = self.local.get_legacy_blob(user)? {
                        remote.set_legacy_blob(user, &blob)?;
                    }
                }
                TOMBSTONES_KEY => remote.set_tombstones(user, &self.local.get_tombstones(user)?)?,
                CLEANUP_QUEUE_KEY => {
                    remote.set_cleanup_queue(user, &self.local.get_cleanup_queue(user)?)?
                }
                SETTINGS_KEY => {
                    if let Some(settings) = self.local.get_settings(user)? {
                        remote.set_settings(user, &settings)?;
                    }
                }
                other => warn!(key = other, "ignoring unknown unsynced key"),
            }
        }

        if !record_ids.is_empty() {
            // Records erased since they were written have nothing to push.
            let records: Vec<EncryptedRecord> = self
                .local
                .list_records(user)?
                .into_iter()
                .filter(|r| record_ids.contains(r.id.as_str()))
                .collect();
            if !records.is_empty() {
                remote.upsert_records(user, &records)?;
            }
        }
        Ok(())
    }

    fn mark_unsynced(&self, user: &str, keys: &[String]) -> Result<()> {
        let _guard = self.sync_lock.lock();
        let mut pending = self.local.get_unsynced_keys(user)?;
        pending.extend(keys.iter().cloned());
        self.local.set_unsynced_keys(user, &pending)
    }

    /// Drop `keys` from the unsynced set once the remote holds a newer value.
    fn clear_unsynced(&self, user: &str, keys: &[String]) {
        let _guard = self.sync_lock.lock();
        let result = self.local.get_unsynced_keys(user).and_then(|mut pending| {
            let before = pending.len();
            for key in keys {
                pending.remove(key);
            }
            if pending.len() == before {
                return Ok(());
            }
            self.local.set_unsynced_keys(user, &pending)
        });
        if let Err(e) = result {
            warn!(error = %e, "could not update unsynced keys");
        }
    }

    // ------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------

    /// Run a write against the remote and mirror it on the device.  If the
    /// remote is unreachable the device copy becomes authoritative for
    /// `keys` until it is pushed.
    fn write(
        &self,
        user: &str,
        what: &str,
        keys: &[String],
        op: impl Fn(&dyn PersistenceBackend) -> Result<()>,
    ) -> Result<()> {
        let Some(remote) = &self.remote else {
            return op(self.local.as_ref());
        };
        let pending = self.flush(remote.as_ref(), user);

        match op(remote.as_ref()) {
            Ok(()) => {
                if let Err(e) = op(self.local.as_ref()) {
                    warn!(error = %e, "could not mirror {what} to device store");
                }
                if keys.iter().any(|k| pending.contains(k)) {
                    self.clear_unsynced(user, keys);
                }
                Ok(())
            }
            Err(VaultError::Persistence(e)) => {
                warn!(error = %e, "remote {what} write failed; saving to device store");
                op(self.local.as_ref())?;
                self.mark_unsynced(user, keys)
            }
            Err(e) => Err(e),
        }
    }

    /// Read from the remote, using the device store when the key is
    /// unsynced, the remote is unreachable, or it returns `None`.
    fn read_optional<T>(
        &self,
        user: &str,
        what: &str,
        key: &str,
        op: impl Fn(&dyn PersistenceBackend) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let Some(remote) = &self.remote else {
            return op(self.local.as_ref());
        };
        if self.flush(remote.as_ref(), user).contains(key) {
            return op(self.local.as_ref());
        }

        match op(remote.as_ref()) {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => op(self.local.as_ref()),
            Err(VaultError::Persistence(e)) => {
                warn!(error = %e, "remote {what} read failed; using device store");
                op(self.local.as_ref())
            }
            Err(e) => Err(e),
        }
    }

    /// Read from the remote, using the device store when the key is
    /// unsynced or the remote is unreachable.
    fn read_required<T>(
        &self,
        user: &str,
        what: &str,
        key: &str,
        op: impl Fn(&dyn PersistenceBackend) -> Result<T>,
    ) -> Result<T> {
        let Some(remote) = &self.remote else {
            return op(self.local.as_ref());
        };
        if self.flush(remote.as_ref(), user).contains(key) {
            return op(self.local.as_ref());
        }

        match op(remote.as_ref()) {
            Err(VaultError::Persistence(e)) => {
                warn!(error = %e, "remote {what} read failed; using device store");
                op(self.local.as_ref())
            }
            other => other,
        }
    }
}

impl PersistenceBackend for TieredStore {
    fn get_credential(&self, user: &str) -> Result<Option<String>> {
        self.read_optional(user, "credential", CREDENTIAL_KEY, |b| {
            b.get_credential(user)
        })
    }

    fn set_credential(&self, user: &str, hash: Option<&str>) -> Result<()> {
        self.write(user, "credential", &[CREDENTIAL_KEY.into()], |b| {
            b.set_credential(user, hash)
        })
    }

    fn get_legacy_blob(&self, user: &str) -> Result<Option<String>> {
        self.read_optional(user, "legacy blob", LEGACY_BLOB_KEY, |b| {
            b.get_legacy_blob(user)
        })
    }

    fn set_legacy_blob(&self, user: &str, blob: &str) -> Result<()> {
        self.write(user, "legacy blob", &[LEGACY_BLOB_KEY.into()], |b| {
            b.set_legacy_blob(user, blob)
        })
    }

    fn list_records(&self, user: &str) -> Result<Vec<EncryptedRecord>> {
        let Some(remote) = &self.remote else {
            return self.local.list_records(user);
        };
        let pending = self.flush(remote.as_ref(), user);

        let mut records = match remote.list_records(user) {
            Ok(records) => records,
            Err(VaultError::Persistence(e)) => {
                warn!(error = %e, "remote record listing failed; using device store");
                return self.local.list_records(user);
            }
            Err(e) => return Err(e),
        };

        let unsynced: HashSet<&str> = pending
            .iter()
            .filter_map(|k| k.strip_prefix(RECORD_KEY_PREFIX))
            .collect();
        if unsynced.is_empty() {
            return Ok(records);
        }

        // The push failed even though the listing worked: device copies
        // of unsynced records replace the remote ones.
        let local = match self.local.list_records(user) {
            Ok(local) => local,
            Err(VaultError::Persistence(e)) => {
                warn!(error = %e, "device store listing failed; using remote records only");
                return Ok(records);
            }
            Err(e) => return Err(e),
        };
        for record in local
            .into_iter()
            .filter(|r| unsynced.contains(r.id.as_str()))
        {
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(slot) => *slot = record,
                None => records.push(record),
            }
        }
        Ok(records)
    }

    fn upsert_records(&self, user: &str, records: &[EncryptedRecord]) -> Result<()> {
        let keys: Vec<String> = records.iter().map(|r| record_key(&r.id)).collect();
        self.write(user, "record", &keys, |b| b.upsert_records(user, records))
    }

    fn delete_records(&self, user: &str, ids: &[String]) -> Result<()> {
        let Some(remote) = &self.remote else {
            return self.local.delete_records(user, ids);
        };
        let pending = self.flush(remote.as_ref(), user);

        let remote_result = remote.delete_records(user, ids);
        let local_result = self.local.delete_records(user, ids);

        if local_result.is_ok() {
            let keys: Vec<String> = ids.iter().map(|id| record_key(id)).collect();
            if keys.iter().any(|k| pending.contains(k)) {
                self.clear_unsynced(user, &keys);
            }
        }

        match (remote_result, local_result) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => {
                warn!(error = %e, "device store delete failed; mirror copies may remain");
                Ok(())
            }
            // The remote copy would reappear on the next listing, so the
            // caller has to keep the ids queued and retry.
            (Err(e), _) => Err(e),
        }
    }

    fn get_tombstones(&self, user: &str) -> Result<IdSet> {
        self.read_required(user, "tombstone", TOMBSTONES_KEY, |b| {
            b.get_tombstones(user)
        })
    }

    fn set_tombstones(&self, user: &str, ids: &IdSet) -> Result<()> {
        self.write(user, "tombstone", &[TOMBSTONES_KEY.into()], |b| {
            b.set_tombstones(user, ids)
        })
    }

    fn get_cleanup_queue(&self, user: &str) -> Result<IdSet> {
        self.read_required(user, "cleanup queue", CLEANUP_QUEUE_KEY, |b| {
            b.get_cleanup_queue(user)
        })
    }

    fn set_cleanup_queue(&self, user: &str, ids: &IdSet) -> Result<()> {
        self.write(user, "cleanup queue", &[CLEANUP_QUEUE_KEY.into()], |b| {
            b.set_cleanup_queue(user, ids)
        })
    }

    fn get_settings(&self, user: &str) -> Result<Option<VaultSettings>> {
        self.read_optional(user, "settings", SETTINGS_KEY, |b| b.get_settings(user))
    }

    fn set_settings(&self, user: &str, settings: &VaultSettings) -> Result<()> {
        self.write(user, "settings", &[SETTINGS_KEY.into()], |b| {
            b.set_settings(user, settings)
        })
    }

    fn get_unsynced_keys(&self, user: &str) -> Result<IdSet> {
        self.local.get_unsynced_keys(user)
    }

    fn set_unsynced_keys(&self, user: &str, keys: &IdSet) -> Result<()> {
        self.local.set_unsynced_keys(user, keys)
    }
}
