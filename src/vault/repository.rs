//! Document life-cycle controller.
//!
//! `VaultRepository` ties together the credential store, the document
//! cipher and a `TieredStore`.  Every document is its own
//! `EncryptedRecord`, so editing one never rewrites another's ciphertext.
//!
//! Per-id state machine:
//!
//! ```text
//! Active --soft_delete--> Tombstoned --restore--> Active
//! Tombstoned --request_permanent_delete--> PendingErasure --unlock--> Gone
//! ```
//!
//! In local-only mode a permanent delete erases at once.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use super::document::{snippet, DocumentPatch, NewDocument, SecretDocument};
use super::migration::{self, MigrationOutcome};
use super::records;
use super::session::VaultSession;
use super::settings::VaultSettings;
use crate::credential::CredentialStore;
use crate::crypto::{hash_secret, verify_secret, DocumentCipher, Pbkdf2Params};
use crate::errors::{Result, VaultError};
use crate::storage::{EncryptedRecord, IdSet, PersistenceBackend, TieredStore};

/// How `unlock_document*` got at the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockPath {
    /// The document has no password of its own.
    NotProtected,
    /// The document password was given.
    Password,
    /// The vault PIN opened a password-protected document.
    PinOverride,
}

#[derive(Debug)]
pub struct UnlockedContent {
    pub content: Zeroizing<String>,
    pub path: UnlockPath,
}

pub struct VaultRepository {
    store: Arc<TieredStore>,
    credentials: CredentialStore,
    cipher: DocumentCipher,
    scope: String,
    session: Mutex<VaultSession>,
    /// Serializes unlock, listing, erasure, migration and rekeying.
    vault_lock: Mutex<()>,
}

impl VaultRepository {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A signed-out vault backed only by the device store.
    pub fn local(local: Arc<dyn PersistenceBackend>, params: Pbkdf2Params) -> Self {
        Self::build(None, TieredStore::local_only(local), params)
    }

    /// A signed-in vault: `remote` first, `local` as fallback.
    pub fn connected(
        user_id: impl Into<String>,
        remote: Arc<dyn PersistenceBackend>,
        local: Arc<dyn PersistenceBackend>,
        params: Pbkdf2Params,
    ) -> Self {
        Self::build(
            Some(user_id.into()),
            TieredStore::connected(remote, local),
            params,
        )
    }

    fn build(user_id: Option<String>, store: TieredStore, params: Pbkdf2Params) -> Self {
        let session = VaultSession::new(user_id, VaultSettings::default().auto_lock_minutes);
        let scope = session.scope().to_string();
        let store = Arc::new(store);
        Self {
            credentials: CredentialStore::new(store.clone(), scope.clone()),
            store,
            cipher: DocumentCipher::new(params),
            scope,
            session: Mutex::new(session),
            vault_lock: Mutex::new(()),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn is_local_only(&self) -> bool {
        self.store.is_local_only()
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.lock().is_unlocked(Utc::now())
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Verify the PIN, open the session, erase anything queued for
    /// erasure, and return the normal listing.
    ///
    /// A failed erasure is logged and retried on the next unlock; it
    /// never blocks access to the vault.
    pub fn unlock(&self, secret: &str) -> Result<Vec<SecretDocument>> {
        let _guard = self.vault_lock.lock();
        self.verify(secret)?;

        match self.settings() {
            Ok(settings) => self
                .session
                .lock()
                .set_auto_lock_minutes(settings.auto_lock_minutes),
            Err(e) => warn!(error = %e, "could not load vault settings; keeping defaults"),
        }

        if let Err(e) = self.erase_pending(secret) {
            error!(error = %e, "deferred erasure failed; will retry on next unlock");
        }

        self.list_inner(secret, false)
    }

    pub fn lock(&self) {
        self.session.lock().lock();
        debug!(scope = %self.scope, "vault locked");
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Every live document in insertion order.  Tombstoned documents are
    /// included only when asked for; documents pending erasure never are.
    pub fn list_documents(
        &self,
        secret: &str,
        include_tombstoned: bool,
    ) -> Result<Vec<SecretDocument>> {
        let _guard = self.vault_lock.lock();
        self.verify(secret)?;
        self.list_inner(secret, include_tombstoned)
    }

    pub fn get_document(&self, secret: &str, id: &str) -> Result<SecretDocument> {
        self.verify(secret)?;
        self.find(secret, id)
    }

    /// Case-insensitive search over title, tags and unprotected content.
    pub fn search_documents(&self, secret: &str, query: &str) -> Result<Vec<SecretDocument>> {
        Ok(self
            .list_documents(secret, false)?
            .into_iter()
            .filter(|d| d.matches(query))
            .collect())
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    pub fn add_document(&self, secret: &str, payload: NewDocument) -> Result<SecretDocument> {
        self.verify(secret)?;
        self.ensure_migrated(secret)?;

        let doc = payload.into_document(Utc::now());
        self.commit(secret, &[doc.clone()])?;
        info!(id = %doc.id, "document added");
        Ok(doc)
    }

    /// Merge `patch` into one document and persist only that record.
    /// Last write wins.
    pub fn update_document(
        &self,
        secret: &str,
        id: &str,
        patch: &DocumentPatch,
    ) -> Result<SecretDocument> {
        self.verify(secret)?;
        let mut doc = self.find(secret, id)?;

        if doc.is_content_encrypted && patch.content.is_some() {
            return Err(VaultError::AlreadyProtected(id.to_string()));
        }

        doc.apply(patch);
        doc.updated_at = Utc::now();
        self.commit(secret, &[doc.clone()])?;
        debug!(id, "document updated");
        Ok(doc)
    }

    // ------------------------------------------------------------------
    // Soft delete / restore / permanent delete
    // ------------------------------------------------------------------

    /// Hide documents from normal listings.  Needs an unlocked session.
    pub fn soft_delete(&self, ids: &[String]) -> Result<()> {
        self.require_session()?;
        let mut tombstones = self.store.get_tombstones(&self.scope)?;
        tombstones.extend(ids.iter().cloned());
        self.store.set_tombstones(&self.scope, &tombstones)?;
        debug!(count = ids.len(), "documents moved to trash");
        Ok(())
    }

    /// Undo `soft_delete`.  Needs an unlocked session.
    pub fn restore(&self, ids: &[String]) -> Result<()> {
        self.require_session()?;
        let mut tombstones = self.store.get_tombstones(&self.scope)?;
        for id in ids {
            tombstones.remove(id);
        }
        self.store.set_tombstones(&self.scope, &tombstones)?;
        debug!(count = ids.len(), "documents restored");
        Ok(())
    }

    /// Remove documents from every view and schedule them for erasure on
    /// the next unlock.  Local-only vaults erase the records right away.
    /// Needs an unlocked session.
    pub fn request_permanent_delete(&self, ids: &[String]) -> Result<()> {
        self.require_session()?;

        let legacy_present = self.legacy_blob()?.is_some();
        let erase_now = self.is_local_only() && !legacy_present;

        if erase_now {
            self.store.delete_records(&self.scope, ids)?;
        } else {
            // Queue before un-tombstoning so the ids are never visible
            // in between.
            let mut queue = self.store.get_cleanup_queue(&self.scope)?;
            queue.extend(ids.iter().cloned());
            self.store.set_cleanup_queue(&self.scope, &queue)?;
        }

        let mut tombstones = self.store.get_tombstones(&self.scope)?;
        for id in ids {
            tombstones.remove(id);
        }
        self.store.set_tombstones(&self.scope, &tombstones)?;

        info!(count = ids.len(), immediate = erase_now, "permanent delete requested");
        Ok(())
    }

    /// Physically erase every queued document.  Idempotent on an empty
    /// queue.  Returns the number of ids that were queued.
    pub fn run_deferred_erasure(&self, secret: &str) -> Result<usize> {
        let _guard = self.vault_lock.lock();
        self.verify(secret)?;
        self.erase_pending(secret)
    }

    // ------------------------------------------------------------------
    // Per-document passwords
    // ------------------------------------------------------------------

    /// Encrypt a document's content under its own password.
    ///
    /// A preview snippet is captured first, and a copy of the content is
    /// kept encrypted under the vault PIN for `unlock_document_with_pin`.
    pub fn set_document_password(
        &self,
        secret: &str,
        id: &str,
        password: &str,
    ) -> Result<SecretDocument> {
        self.verify(secret)?;
        let mut doc = self.find(secret, id)?;
        if doc.has_password {
            return Err(VaultError::AlreadyProtected(id.to_string()));
        }

        let plaintext = Zeroizing::new(std::mem::take(&mut doc.content));
        doc.preview = Some(snippet(&plaintext));
        doc.recovery_envelope = Some(self.cipher.encrypt(&plaintext, secret)?);
        doc.content = self.cipher.encrypt(&plaintext, password)?;
        doc.password_hash = Some(hash_secret(password));
        doc.has_password = true;
        doc.is_content_encrypted = true;
        doc.updated_at = Utc::now();

        self.commit(secret, &[doc.clone()])?;
        info!(id, "document password set");
        Ok(doc)
    }

    /// Open a document with its own password.
    ///
    /// An unknown id is `NotFound`; a wrong password is `Authentication`.
    pub fn unlock_document(
        &self,
        secret: &str,
        id: &str,
        password: &str,
    ) -> Result<UnlockedContent> {
        self.verify(secret)?;
        let doc = self.find(secret, id)?;
        self.open_with_password(&doc, password)
    }

    /// Open a password-protected document with the vault PIN alone.
    ///
    /// This deliberately bypasses the document password.  Callers should
    /// tell the user which path was taken.
    pub fn unlock_document_with_pin(&self, secret: &str, id: &str) -> Result<UnlockedContent> {
        self.verify(secret)?;
        let doc = self.find(secret, id)?;
        if !doc.is_content_encrypted {
            return Ok(UnlockedContent {
                content: Zeroizing::new(doc.content),
                path: UnlockPath::NotProtected,
            });
        }

        let Some(envelope) = doc.recovery_envelope.as_deref() else {
            warn!(id, "document has no PIN recovery copy");
            return Err(VaultError::Authentication);
        };
        let content = self.cipher.decrypt(envelope, secret)?;
        warn!(id, "document opened with vault PIN instead of its password");
        Ok(UnlockedContent {
            content,
            path: UnlockPath::PinOverride,
        })
    }

    /// Store the content as plaintext again and clear the password fields.
    pub fn remove_document_password(
        &self,
        secret: &str,
        id: &str,
        password: &str,
    ) -> Result<SecretDocument> {
        self.verify(secret)?;
        let mut doc = self.find(secret, id)?;
        let unlocked = self.open_with_password(&doc, password)?;

        doc.content = unlocked.content.to_string();
        doc.has_password = false;
        doc.password_hash = None;
        doc.is_content_encrypted = false;
        doc.preview = None;
        doc.recovery_envelope = None;
        doc.updated_at = Utc::now();

        self.commit(secret, &[doc.clone()])?;
        info!(id, "document password removed");
        Ok(doc)
    }

    // ------------------------------------------------------------------
    // PIN and settings
    // ------------------------------------------------------------------

    /// Re-encrypt the whole vault under `new` and replace the credential.
    ///
    /// Records that do not open under `old` are left as they are.  If any
    /// write fails, the records and legacy blob are put back as they were
    /// so the vault keeps opening under `old`.
    pub fn change_pin(&self, old: &str, new: &str) -> Result<usize> {
        let _guard = self.vault_lock.lock();
        self.credentials.require_pin(old)?;

        let existing = self.store.list_records(&self.scope)?;
        let blob = self.legacy_blob()?;
        let count = match self.rekey_all(&existing, blob.as_deref(), old, new) {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "PIN change failed; restoring records under the old PIN");
                self.restore_rekeyed(&existing, blob.as_deref());
                return Err(e);
            }
        };

        self.session.lock().mark_verified(Utc::now());
        info!(count, "vault re-encrypted under new PIN");
        Ok(count)
    }

    /// Stored settings, or the defaults when none were saved.
    pub fn settings(&self) -> Result<VaultSettings> {
        Ok(self
            .store
            .get_settings(&self.scope)?
            .map(VaultSettings::with_category_defaults)
            .unwrap_or_default())
    }

    pub fn save_settings(&self, settings: &VaultSettings) -> Result<()> {
        settings.validate()?;
        self.store.set_settings(&self.scope, settings)?;
        self.session
            .lock()
            .set_auto_lock_minutes(settings.auto_lock_minutes);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Migration
    // ------------------------------------------------------------------

    /// Split the legacy blob into per-document records if that has not
    /// happened yet.  Running it again changes nothing.
    pub fn migrate_legacy(&self, secret: &str) -> Result<MigrationOutcome> {
        let _guard = self.vault_lock.lock();
        self.verify(secret)?;
        self.migrate(secret)
    }

    // ------------------------------------------------------------------
    // Internals shared with `backup`
    // ------------------------------------------------------------------

    /// Check the PIN and refresh the session.
    pub(super) fn verify(&self, secret: &str) -> Result<()> {
        self.credentials.require_pin(secret)?;
        self.session.lock().mark_verified(Utc::now());
        Ok(())
    }

    /// Every stored document except those pending erasure, tombstoned
    /// ones included.  Migrates from the legacy blob when no records
    /// exist yet, but keeps serving the blob if that write fails.
    pub(super) fn load_all(&self, secret: &str) -> Result<Vec<SecretDocument>> {
        let stored = self.store.list_records(&self.scope)?;
        let docs = if stored.is_empty() {
            self.load_legacy(secret)?
        } else {
            records::open_all(&self.cipher, &stored, secret)
        };

        let queue = self.store.get_cleanup_queue(&self.scope)?;
        Ok(docs.into_iter().filter(|d| !queue.contains(&d.id)).collect())
    }

    /// Persist documents as records, then retire the legacy blob.
    pub(super) fn commit(&self, secret: &str, docs: &[SecretDocument]) -> Result<()> {
        let sealed = records::seal_all(&self.cipher, docs, secret)?;
        self.store.upsert_records(&self.scope, &sealed)?;
        self.retire_legacy_blob(secret);
        Ok(())
    }

    /// Migrate now if records do not exist yet, failing on a write error.
    /// Writers call this so the blob is never retired before its
    /// documents exist as records.
    pub(super) fn ensure_migrated(&self, secret: &str) -> Result<()> {
        let _guard = self.vault_lock.lock();
        self.migrate(secret).map(|_| ())
    }

    pub(super) fn erase_pending_locked(&self, secret: &str) -> Result<usize> {
        let _guard = self.vault_lock.lock();
        self.erase_pending(secret)
    }

    /// Queue `ids` for erasure and run it straight away, bypassing the
    /// trash.  Returns how many ids were erased.
    pub(super) fn erase_immediately(&self, secret: &str, ids: &IdSet) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let _guard = self.vault_lock.lock();

        let mut queue = self.store.get_cleanup_queue(&self.scope)?;
        queue.extend(ids.iter().cloned());
        self.store.set_cleanup_queue(&self.scope, &queue)?;

        let mut tombstones = self.store.get_tombstones(&self.scope)?;
        tombstones.retain(|id| !ids.contains(id));
        self.store.set_tombstones(&self.scope, &tombstones)?;

        self.erase_pending(secret)?;
        Ok(ids.len())
    }

    pub(super) fn cipher(&self) -> &DocumentCipher {
        &self.cipher
    }

    // ------------------------------------------------------------------
    // Private helpers
    // ------------------------------------------------------------------

    fn require_session(&self) -> Result<()> {
        let mut session = self.session.lock();
        let now = Utc::now();
        if !session.is_unlocked(now) {
            return Err(VaultError::Locked);
        }
        session.touch(now);
        Ok(())
    }

    fn list_inner(&self, secret: &str, include_tombstoned: bool) -> Result<Vec<SecretDocument>> {
        let docs = self.load_all(secret)?;
        if include_tombstoned {
            return Ok(docs);
        }
        let tombstones = self.store.get_tombstones(&self.scope)?;
        Ok(docs
            .into_iter()
            .filter(|d| !tombstones.contains(&d.id))
            .collect())
    }

    fn find(&self, secret: &str, id: &str) -> Result<SecretDocument> {
        self.ensure_migrated(secret)?;
        self.load_all(secret)?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| VaultError::NotFound(id.to_string()))
    }

    fn open_with_password(&self, doc: &SecretDocument, password: &str) -> Result<UnlockedContent> {
        if !doc.is_content_encrypted {
            return Ok(UnlockedContent {
                content: Zeroizing::new(doc.content.clone()),
                path: UnlockPath::NotProtected,
            });
        }

        let hash_ok = doc
            .password_hash
            .as_deref()
            .is_some_and(|stored| verify_secret(password, stored));
        if !hash_ok {
            return Err(VaultError::Authentication);
        }

        Ok(UnlockedContent {
            content: self.cipher.decrypt(&doc.content, password)?,
            path: UnlockPath::Password,
        })
    }

    /// The legacy blob, if one with content is stored.
    fn legacy_blob(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get_legacy_blob(&self.scope)?
            .filter(|b| !migration::is_blank(b)))
    }

    /// Documents from the legacy blob, migrating them on the way.
    fn load_legacy(&self, secret: &str) -> Result<Vec<SecretDocument>> {
        let Some(blob) = self.legacy_blob()? else {
            return Ok(Vec::new());
        };
        let docs = match migration::decode_blob(&self.cipher, &blob, secret) {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "legacy blob does not open under this PIN");
                return Ok(Vec::new());
            }
        };

        if let Err(e) = self.write_migrated(&docs, secret) {
            warn!(error = %e, "migration write failed; serving legacy blob and retrying later");
        }
        Ok(docs)
    }

    fn migrate(&self, secret: &str) -> Result<MigrationOutcome> {
        if !self.store.list_records(&self.scope)?.is_empty() {
            return Ok(MigrationOutcome::AlreadyMigrated);
        }
        let Some(blob) = self.legacy_blob()? else {
            return Ok(MigrationOutcome::NoLegacyData);
        };
        let docs = match migration::decode_blob(&self.cipher, &blob, secret) {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "legacy blob does not open under this PIN");
                return Ok(MigrationOutcome::NoLegacyData);
            }
        };
        self.write_migrated(&docs, secret)?;
        Ok(MigrationOutcome::Migrated(docs.len()))
    }

    /// Write blob documents as records.  The blob itself stays.
    fn write_migrated(&self, docs: &[SecretDocument], secret: &str) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let sealed = records::seal_all(&self.cipher, docs, secret)?;
        self.store.upsert_records(&self.scope, &sealed)?;
        info!(count = sealed.len(), "migrated legacy blob to per-document records");
        Ok(())
    }

    /// Clear a legacy blob that opens under `secret`.  Failures are logged;
    /// the records already hold everything the blob did.
    fn retire_legacy_blob(&self, secret: &str) {
        let blob = match self.legacy_blob() {
            Ok(Some(blob)) => blob,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "could not read legacy blob to retire it");
                return;
            }
        };
        if self.cipher.decrypt(&blob, secret).is_err() {
            debug!("keeping legacy blob that does not open under this PIN");
            return;
        }
        match self.store.set_legacy_blob(&self.scope, "") {
            Ok(()) => info!("legacy blob retired"),
            Err(e) => warn!(error = %e, "could not retire legacy blob"),
        }
    }

    fn erase_pending(&self, secret: &str) -> Result<usize> {
        let queue = self.store.get_cleanup_queue(&self.scope)?;
        if queue.is_empty() {
            return Ok(0);
        }

        let has_records = !self.store.list_records(&self.scope)?.is_empty();
        if has_records {
            // Retire first: a surviving blob could bring erased
            // documents back once every record is gone.
            self.retire_legacy_blob(secret);
            let ids: Vec<String> = queue.iter().cloned().collect();
            self.store.delete_records(&self.scope, &ids)?;
        } else if let Some(blob) = self.legacy_blob()? {
            let remaining: Vec<SecretDocument> = migration::decode_blob(&self.cipher, &blob, secret)?
                .into_iter()
                .filter(|d| !queue.contains(&d.id))
                .collect();
            let reencoded = migration::encode_blob(&self.cipher, &remaining, secret)?;
            self.store.set_legacy_blob(&self.scope, &reencoded)?;
        }

        self.store.set_cleanup_queue(&self.scope, &IdSet::new())?;
        info!(count = queue.len(), "deferred erasure complete");
        Ok(queue.len())
    }

    /// Write every record and the legacy blob under `new`, then swap the
    /// credential.  The credential goes last so a failure before it leaves
    /// `old` in charge.
    fn rekey_all(
        &self,
        existing: &[EncryptedRecord],
        blob: Option<&str>,
        old: &str,
        new: &str,
    ) -> Result<usize> {
        let rekeyed: Vec<EncryptedRecord> = existing
            .par_iter()
            .filter_map(|record| match self.rekey_record(record, old, new) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(id = %record.id, error = %e, "leaving record under the old PIN");
                    None
                }
            })
            .collect();
        if !rekeyed.is_empty() {
            self.store.upsert_records(&self.scope, &rekeyed)?;
        }

        if let Some(blob) = blob {
            let reencoded = migration::decode_blob(&self.cipher, blob, old)
                .and_then(|docs| migration::encode_blob(&self.cipher, &docs, new));
            match reencoded {
                Ok(b) => self.store.set_legacy_blob(&self.scope, &b)?,
                Err(e) => warn!(error = %e, "leaving legacy blob under the old PIN"),
            }
        }

        self.credentials.change_pin(old, new)?;
        Ok(rekeyed.len())
    }

    /// Put back the ciphertexts captured before a failed PIN change.
    fn restore_rekeyed(&self, existing: &[EncryptedRecord], blob: Option<&str>) {
        if !existing.is_empty() {
            if let Err(e) = self.store.upsert_records(&self.scope, existing) {
                error!(error = %e, "could not restore records after failed PIN change");
            }
        }
        if let Some(blob) = blob {
            if let Err(e) = self.store.set_legacy_blob(&self.scope, blob) {
                error!(error = %e, "could not restore legacy blob after failed PIN change");
            }
        }
    }

    fn rekey_record(&self, record: &EncryptedRecord, old: &str, new: &str) -> Result<EncryptedRecord> {
        let mut doc = records::open(&self.cipher, record, old)?;
        if let Some(envelope) = doc.recovery_envelope.take() {
            let content = self.cipher.decrypt(&envelope, old)?;
            doc.recovery_envelope = Some(self.cipher.encrypt(&content, new)?);
        }
        records::seal(&self.cipher, &doc, new)
    }
}
