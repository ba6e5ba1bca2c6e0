//! On-device backend: plain files under a root directory.
//!
//! Layout for each scope:
//!
//! ```text
//! <root>/<scope>/credential        salt:hash text
//! <root>/<scope>/legacy.blob       monolithic ciphertext from older versions
//! <root>/<scope>/tombstones.json   ["id", ...]
//! <root>/<scope>/cleanup.json      ["id", ...]
//! <root>/<scope>/settings.json     VaultSettings
//! <root>/<scope>/unsynced.json     keys awaiting upload to the remote tier
//! <root>/<scope>/records/<id>.rec  one encoded ciphertext per document
//! ```
//!
//! Each record has its own file, so editing one document never rewrites
//! another's ciphertext.  Records are listed in id order.  Ids start with a
//! millisecond timestamp, so id order is creation order.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{EncryptedRecord, IdSet, PersistenceBackend};
use crate::errors::{Result, VaultError};
use crate::vault::VaultSettings;

const CREDENTIAL_FILE: &str = "credential";
const LEGACY_FILE: &str = "legacy.blob";
const TOMBSTONES_FILE: &str = "tombstones.json";
const CLEANUP_FILE: &str = "cleanup.json";
const SETTINGS_FILE: &str = "settings.json";
const UNSYNCED_FILE: &str = "unsynced.json";
const RECORDS_DIR: &str = "records";
const RECORD_EXT: &str = "rec";

/// Maximum length of a scope name or record id used as a file name.
const MAX_KEY_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Use `root` as the storage directory.  Nothing is created until the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, user: &str) -> Result<PathBuf> {
        validate_key("scope", user)?;
        Ok(self.root.join(user))
    }

    fn records_dir(&self, user: &str) -> Result<PathBuf> {
        Ok(self.scope_dir(user)?.join(RECORDS_DIR))
    }

    fn record_path(&self, user: &str, id: &str) -> Result<PathBuf> {
        validate_key("record id", id)?;
        Ok(self
            .records_dir(user)?
            .join(format!("{id}.{RECORD_EXT}")))
    }

    fn read_text(&self, user: &str, name: &str) -> Result<Option<String>> {
        let path = self.scope_dir(user)?.join(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(persistence(&path, e)),
        }
    }

    fn write_text(&self, user: &str, name: &str, text: &str) -> Result<()> {
        let path = self.scope_dir(user)?.join(name);
        atomic_write(&path, text.as_bytes())
    }

    fn read_json<T: DeserializeOwned>(&self, user: &str, name: &str) -> Result<Option<T>> {
        match self.read_text(user, name)? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| VaultError::SerializationError(format!("{name}: {e}"))),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(&self, user: &str, name: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| VaultError::SerializationError(format!("{name}: {e}")))?;
        self.write_text(user, name, &text)
    }
}

impl PersistenceBackend for FileBackend {
    fn get_credential(&self, user: &str) -> Result<Option<String>> {
        Ok(self
            .read_text(user, CREDENTIAL_FILE)?
            .map(|s| s.trim().to_string()))
    }

    fn set_credential(&self, user: &str, hash: Option<&str>) -> Result<()> {
        match hash {
            Some(h) => self.write_text(user, CREDENTIAL_FILE, h),
            None => {
                let path = self.scope_dir(user)?.join(CREDENTIAL_FILE);
                remove_if_exists(&path)
            }
        }
    }

    fn get_legacy_blob(&self, user: &str) -> Result<Option<String>> {
        self.read_text(user, LEGACY_FILE)
    }

    fn set_legacy_blob(&self, user: &str, blob: &str) -> Result<()> {
        self.write_text(user, LEGACY_FILE, blob)
    }

    fn list_records(&self, user: &str) -> Result<Vec<EncryptedRecord>> {
        let dir = self.records_dir(user)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence(&dir, e)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| persistence(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let encoded_ciphertext = fs::read_to_string(&path).map_err(|e| persistence(&path, e))?;
            records.push(EncryptedRecord {
                id: id.to_string(),
                encoded_ciphertext: encoded_ciphertext.trim().to_string(),
            });
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn upsert_records(&self, user: &str, records: &[EncryptedRecord]) -> Result<()> {
        for record in records {
            let path = self.record_path(user, &record.id)?;
            atomic_write(&path, record.encoded_ciphertext.as_bytes())?;
        }
        Ok(())
    }

    fn delete_records(&self, user: &str, ids: &[String]) -> Result<()> {
        for id in ids {
            remove_if_exists(&self.record_path(user, id)?)?;
        }
        Ok(())
    }

    fn get_tombstones(&self, user: &str) -> Result<IdSet> {
        Ok(self.read_json(user, TOMBSTONES_FILE)?.unwrap_or_default())
    }

    fn set_tombstones(&self, user: &str, ids: &IdSet) -> Result<()> {
        self.write_json(user, TOMBSTONES_FILE, ids)
    }

    fn get_cleanup_queue(&self, user: &str) -> Result<IdSet> {
        Ok(self.read_json(user, CLEANUP_FILE)?.unwrap_or_default())
    }

    fn set_cleanup_queue(&self, user: &str, ids: &IdSet) -> Result<()> {
        self.write_json(user, CLEANUP_FILE, ids)
    }

    fn get_settings(&self, user: &str) -> Result<Option<VaultSettings>> {
        self.read_json(user, SETTINGS_FILE)
    }

    fn set_settings(&self, user: &str, settings: &VaultSettings) -> Result<()> {
        self.write_json(user, SETTINGS_FILE, settings)
    }

    fn get_unsynced_keys(&self, user: &str) -> Result<IdSet> {
        Ok(self.read_json(user, UNSYNCED_FILE)?.unwrap_or_default())
    }

    fn set_unsynced_keys(&self, user: &str, keys: &IdSet) -> Result<()> {
        if keys.is_empty() {
            return remove_if_exists(&self.scope_dir(user)?.join(UNSYNCED_FILE));
        }
        self.write_json(user, UNSYNCED_FILE, keys)
    }
}

/// Only ASCII letters, digits, `_`, `-` and `.` may appear in a name that
/// becomes part of a path, and it may not start with `.`.
fn validate_key(kind: &str, key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.');
    if valid {
        Ok(())
    } else {
        Err(VaultError::Format(format!(
            "{kind} '{key}' contains characters that are not allowed in storage keys"
        )))
    }
}

/// Write to a temp file in the same directory, then rename over `path`,
/// so readers never see a half-written file.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| persistence(parent, e))?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, data).map_err(|e| persistence(&tmp_path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&tmp_path, perms).map_err(|e| persistence(&tmp_path, e))?;
    }

    fs::rename(&tmp_path, path).map_err(|e| persistence(path, e))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(persistence(path, e)),
    }
}

fn persistence(path: &Path, e: std::io::Error) -> VaultError {
    VaultError::Persistence(format!("{}: {e}", path.display()))
}
