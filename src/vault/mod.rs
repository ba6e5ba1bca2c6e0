//! Vault module: documents and their life-cycle.
//!
//! This module provides:
//! - `SecretDocument` and the add/edit payload types (`document`)
//! - Per-user preferences (`settings`)
//! - The explicit unlocked-session state (`session`)
//! - Record sealing and the legacy blob layout (`records`, `migration`)
//! - `VaultRepository`, the life-cycle controller (`repository`)
//! - Whole-vault export and import (`backup`)

pub mod backup;
pub mod document;
pub mod migration;
pub mod records;
pub mod repository;
pub mod session;
pub mod settings;

// Re-export the most commonly used items.
pub use backup::{Backup, ImportMode, ImportSummary};
pub use document::{sort_documents, DocumentPatch, NewDocument, SecretDocument, SortKey};
pub use migration::MigrationOutcome;
pub use repository::{UnlockPath, UnlockedContent, VaultRepository};
pub use session::VaultSession;
pub use settings::VaultSettings;
