//! Integration tests for the on-device file store and tier routing.

use std::sync::Arc;

use docvault::errors::VaultError;
use docvault::storage::{EncryptedRecord, FileBackend, IdSet, PersistenceBackend, TieredStore};
use docvault::vault::VaultSettings;
use tempfile::TempDir;

const USER: &str = "alice";

fn record(id: &str, ct: &str) -> EncryptedRecord {
    EncryptedRecord {
        id: id.into(),
        encoded_ciphertext: ct.into(),
    }
}

/// A file backend rooted at a regular file, so every access fails.
fn unreachable_backend(dir: &TempDir) -> FileBackend {
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"").unwrap();
    FileBackend::new(blocker)
}

#[test]
fn file_backend_keeps_every_key_across_instances() {
    let dir = TempDir::new().unwrap();
    {
        let store = FileBackend::new(dir.path());
        store.set_credential(USER, Some("c2FsdA==:aGFzaA==")).unwrap();
        store.set_legacy_blob(USER, "a:b:c").unwrap();
        store
            .upsert_records(USER, &[record("secret_1_aaaaaaaaa", "x:y:z")])
            .unwrap();
        store
            .set_tombstones(USER, &IdSet::from(["secret_1_aaaaaaaaa".to_string()]))
            .unwrap();
        store
            .set_cleanup_queue(USER, &IdSet::from(["secret_2_bbbbbbbbb".to_string()]))
            .unwrap();
        store
            .set_settings(
                USER,
                &VaultSettings {
                    pin_length: 4,
                    ..VaultSettings::default()
                },
            )
            .unwrap();
    }

    let store = FileBackend::new(dir.path());
    assert_eq!(
        store.get_credential(USER).unwrap().as_deref(),
        Some("c2FsdA==:aGFzaA==")
    );
    assert_eq!(store.get_legacy_blob(USER).unwrap().as_deref(), Some("a:b:c"));
    assert_eq!(
        store.list_records(USER).unwrap(),
        vec![record("secret_1_aaaaaaaaa", "x:y:z")]
    );
    assert!(store.get_tombstones(USER).unwrap().contains("secret_1_aaaaaaaaa"));
    assert!(store
        .get_cleanup_queue(USER)
        .unwrap()
        .contains("secret_2_bbbbbbbbb"));
    assert_eq!(store.get_settings(USER).unwrap().unwrap().pin_length, 4);
}

#[test]
fn file_backend_scopes_do_not_leak() {
    let dir = TempDir::new().unwrap();
    let store = FileBackend::new(dir.path());
    store
        .upsert_records("alice", &[record("secret_1_aaaaaaaaa", "x:y:z")])
        .unwrap();

    assert!(store.list_records("bob").unwrap().is_empty());
    assert!(store.get_credential("bob").unwrap().is_none());
}

#[test]
fn unreachable_file_backend_reports_persistence_errors() {
    let dir = TempDir::new().unwrap();
    let store = unreachable_backend(&dir);
    assert!(matches!(
        store.set_credential(USER, Some("h")),
        Err(VaultError::Persistence(_))
    ));
    assert!(matches!(
        store.upsert_records(USER, &[record("secret_1_aaaaaaaaa", "x")]),
        Err(VaultError::Persistence(_))
    ));
}

#[test]
fn tiered_store_over_files_pushes_offline_writes_on_reconnect() {
    let dir = TempDir::new().unwrap();
    let local = Arc::new(FileBackend::new(dir.path().join("device")));

    // Remote down: the write lands on the device.
    let offline = TieredStore::connected(Arc::new(unreachable_backend(&dir)), local.clone());
    offline
        .upsert_records(USER, &[record("secret_2_offline00", "o:f:f")])
        .unwrap();
    assert_eq!(local.list_records(USER).unwrap().len(), 1);
    assert_eq!(offline.list_records(USER).unwrap().len(), 1);
    assert!(local
        .get_unsynced_keys(USER)
        .unwrap()
        .contains("record:secret_2_offline00"));

    // Remote back: the offline write is pushed before the listing.
    let remote = Arc::new(FileBackend::new(dir.path().join("remote")));
    remote
        .upsert_records(USER, &[record("secret_1_online000", "o:n:l")])
        .unwrap();
    let online = TieredStore::connected(remote.clone(), local.clone());
    let ids: Vec<_> = online
        .list_records(USER)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["secret_1_online000", "secret_2_offline00"]);
    assert_eq!(remote.list_records(USER).unwrap().len(), 2);
    assert!(local.get_unsynced_keys(USER).unwrap().is_empty());

    // Deleting clears both tiers.
    online
        .delete_records(USER, &["secret_2_offline00".to_string()])
        .unwrap();
    assert!(local.list_records(USER).unwrap().is_empty());
    assert_eq!(remote.list_records(USER).unwrap().len(), 1);
}

#[test]
fn local_only_tier_surfaces_device_failures() {
    let dir = TempDir::new().unwrap();
    let store = TieredStore::local_only(Arc::new(unreachable_backend(&dir)));
    assert!(store.is_local_only());
    assert!(matches!(
        store.set_tombstones(USER, &IdSet::new()),
        Err(VaultError::Persistence(_))
    ));
}
