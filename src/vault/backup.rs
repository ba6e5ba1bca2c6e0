//! Whole-vault export and import.
//!
//! A backup is plain JSON: `{version, exportDate, docs, settings}`.
//! Unprotected document content is in the clear, so callers must treat
//! the file as sensitive.  Password-protected content stays encrypted
//! under its document password.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::document::SecretDocument;
use super::repository::VaultRepository;
use super::settings::VaultSettings;
use crate::errors::{Result, VaultError};
use crate::storage::IdSet;

/// Backup format version written by `export_backup`.
pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub docs: Vec<SecretDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<VaultSettings>,
}

impl Backup {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::SerializationError(format!("backup: {e}")))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let backup: Self = serde_json::from_str(json)
            .map_err(|e| VaultError::Format(format!("backup file: {e}")))?;
        if backup.version != BACKUP_VERSION {
            return Err(VaultError::Format(format!(
                "unsupported backup version '{}' (expected {BACKUP_VERSION})",
                backup.version
            )));
        }
        Ok(backup)
    }
}

/// What happens to documents that exist in the vault but not in the backup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep them next to the imported ones.
    #[default]
    Merge,
    /// Erase them, so the vault ends up holding exactly the backup.
    Replace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub replaced: usize,
    /// Documents erased because the backup did not have them.
    pub removed: usize,
}

impl VaultRepository {
    /// Snapshot every live (non-trashed) document plus the settings.
    pub fn export_backup(&self, secret: &str) -> Result<Backup> {
        let docs = self.list_documents(secret, false)?;
        let settings = self.settings()?;
        info!(count = docs.len(), "vault exported");
        Ok(Backup {
            version: BACKUP_VERSION.to_string(),
            export_date: Utc::now(),
            docs,
            settings: Some(settings),
        })
    }

    /// Write every document in `backup` as a record, replacing documents
    /// with the same id, and adopt its settings.  In `Replace` mode,
    /// documents missing from the backup are erased, trashed ones included.
    ///
    /// Queued erasures run first so an imported id never collides with a
    /// record that is still owed removal.
    pub fn import_backup(
        &self,
        secret: &str,
        backup: &Backup,
        mode: ImportMode,
    ) -> Result<ImportSummary> {
        self.verify(secret)?;
        self.ensure_migrated(secret)?;
        self.erase_pending_locked(secret)?;

        let existing = self.load_all(secret)?;
        let mut summary = ImportSummary::default();
        for doc in &backup.docs {
            if existing.iter().any(|d| d.id == doc.id) {
                summary.replaced += 1;
            } else {
                summary.added += 1;
            }
        }

        if !backup.docs.is_empty() {
            self.commit(secret, &backup.docs)?;
        }

        if mode == ImportMode::Replace {
            let stale: IdSet = existing
                .into_iter()
                .map(|d| d.id)
                .filter(|id| !backup.docs.iter().any(|d| &d.id == id))
                .collect();
            summary.removed = self.erase_immediately(secret, &stale)?;
        }

        if let Some(settings) = &backup.settings {
            self.save_settings(settings)?;
        }

        info!(
            added = summary.added,
            replaced = summary.replaced,
            removed = summary.removed,
            "backup imported"
        );
        Ok(summary)
    }
}
