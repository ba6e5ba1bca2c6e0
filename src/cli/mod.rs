//! CLI module: Clap argument parser, prompts, output helpers, and command
//! implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::credential::validate_pin;
use crate::errors::{Result, VaultError};
use crate::storage::FileBackend;
use crate::vault::{SecretDocument, VaultRepository, VaultSettings};

/// Environment variable that supplies the vault PIN (scripts and CI).
pub const PIN_ENV: &str = "DOCVAULT_PIN";

/// Environment variable that supplies the replacement PIN for `pin change`.
pub const NEW_PIN_ENV: &str = "DOCVAULT_NEW_PIN";

/// Environment variable that supplies a document password.
pub const DOC_PASSWORD_ENV: &str = "DOCVAULT_DOC_PASSWORD";

/// DocVault CLI: encrypted secret-document vault.
#[derive(Parser)]
#[command(
    name = "docvault",
    about = "Encrypted secret-document vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// On-device data directory (default from .docvault.toml, else .docvault)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Directory acting as the remote store (requires --user)
    #[arg(long, global = true)]
    pub remote_dir: Option<String>,

    /// Signed-in user id; without one the vault is local-only
    #[arg(long, global = true)]
    pub user: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Set the vault PIN for a new vault
    Init,

    /// List documents
    List {
        /// Include documents in the trash
        #[arg(short, long)]
        all: bool,

        /// Sort order: date (default) or importance
        #[arg(long, default_value = "date")]
        sort: String,

        /// Oldest / least important first
        #[arg(long)]
        asc: bool,

        /// Only show one category
        #[arg(long)]
        category: Option<String>,
    },

    /// Add a document
    Add {
        /// Document title
        #[arg(short, long)]
        title: String,

        /// Category id (default: personal)
        #[arg(short, long)]
        category: Option<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Mark as important
        #[arg(long)]
        important: bool,

        /// Content (read from stdin or prompted for when omitted)
        #[arg(long)]
        content: Option<String>,
    },

    /// Show one document
    Show {
        /// Document id
        id: String,

        /// Open a password-protected document with the vault PIN instead
        #[arg(long)]
        use_pin: bool,
    },

    /// Edit a document
    Edit {
        /// Document id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Replace the tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long, conflicts_with = "not_important")]
        important: bool,

        #[arg(long)]
        not_important: bool,
    },

    /// Move documents to the trash
    Delete {
        /// Document ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Restore documents from the trash
    Restore {
        /// Document ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Permanently delete documents (erased on next unlock)
    Purge {
        /// Document ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Protect a document with its own password
    Protect {
        /// Document id
        id: String,
    },

    /// Remove a document's password
    Unprotect {
        /// Document id
        id: String,
    },

    /// Manage the vault PIN
    Pin {
        #[command(subcommand)]
        action: PinAction,
    },

    /// Search titles, tags and unprotected content
    Search {
        /// Text to look for (case-insensitive)
        query: String,
    },

    /// Export all documents to a JSON backup
    Export {
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import documents from a JSON backup
    Import {
        /// Path to the backup file
        file: String,

        /// Erase documents that are not in the backup
        #[arg(long)]
        replace: bool,
    },

    /// Show or change vault settings
    Settings {
        /// Minutes of inactivity before the session locks (0 disables)
        #[arg(long)]
        auto_lock: Option<u32>,

        /// Number of digits for new PINs (4 or 6)
        #[arg(long)]
        pin_length: Option<usize>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Show version
    Version,
}

/// PIN subcommands.
#[derive(clap::Subcommand)]
pub enum PinAction {
    /// Change the PIN and re-encrypt every document
    Change,

    /// Forget the PIN and issue a temporary one
    Reset {
        /// Confirm that documents under the old PIN become unreadable
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Project settings with CLI flags applied on top.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(&cwd)?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir.clone_from(dir);
    }
    if let Some(dir) = &cli.remote_dir {
        settings.remote_dir = Some(dir.clone());
    }
    if let Some(user) = &cli.user {
        settings.user = Some(user.clone());
    }
    Ok(settings)
}

/// On-device data directory for this invocation.
pub fn data_path(cli: &Cli) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(load_settings(cli)?.data_path(&cwd))
}

/// Build the repository described by the config file and flags.
///
/// A user plus a remote directory gives a connected vault; no user gives
/// a local-only one.
pub fn open_repository(cli: &Cli) -> Result<VaultRepository> {
    let cwd = std::env::current_dir()?;
    let settings = load_settings(cli)?;
    let params = settings.pbkdf2_params();
    let local = Arc::new(FileBackend::new(settings.data_path(&cwd)));

    match (&settings.user, settings.remote_path(&cwd)) {
        (Some(user), Some(remote)) => Ok(VaultRepository::connected(
            user.clone(),
            Arc::new(FileBackend::new(remote)),
            local,
            params,
        )),
        (Some(_), None) => Err(VaultError::ConfigError(
            "a user was given but no remote_dir is configured".into(),
        )),
        (None, remote) => {
            if remote.is_some() {
                tracing::warn!("remote_dir is ignored without a user");
            }
            Ok(VaultRepository::local(local, params))
        }
    }
}

/// Open the repository, ask for the PIN and unlock.
///
/// Unlocking also runs any queued permanent deletions.
pub fn unlock_vault(cli: &Cli) -> Result<(VaultRepository, Zeroizing<String>, Vec<SecretDocument>)> {
    let repo = open_repository(cli)?;
    if !repo.credentials().has_pin_set()? {
        output::tip("Run `docvault init` to set a PIN.");
        return Err(VaultError::NoPinSet);
    }
    let pin = prompt_pin()?;
    let docs = repo.unlock(&pin)?;
    Ok((repo, pin, docs))
}

/// Get the vault PIN, trying in order:
/// 1. `DOCVAULT_PIN` env var (CI/scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the PIN is wiped from memory on drop.
pub fn prompt_pin() -> Result<Zeroizing<String>> {
    if let Some(pin) = env_secret(PIN_ENV) {
        return Ok(pin);
    }

    let pin = dialoguer::Password::new()
        .with_prompt("Enter vault PIN")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("PIN prompt: {e}")))?;
    Ok(Zeroizing::new(pin))
}

/// Prompt for a new PIN with confirmation.
///
/// `env_var` is checked first for scripted use.  The PIN must match the
/// length in the vault settings.
pub fn prompt_new_pin(env_var: &str, settings: &VaultSettings) -> Result<Zeroizing<String>> {
    if let Some(pin) = env_secret(env_var) {
        validate_pin(&pin, settings)?;
        return Ok(pin);
    }

    loop {
        let pin = dialoguer::Password::new()
            .with_prompt(format!("Choose a {}-digit PIN", settings.pin_length))
            .with_confirmation("Confirm PIN", "PINs do not match, try again")
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("PIN prompt: {e}")))?;
        let pin = Zeroizing::new(pin);

        if let Err(e) = validate_pin(&pin, settings) {
            output::warning(&format!("{e}. Try again."));
            continue;
        }

        return Ok(pin);
    }
}

/// Get a document password from `DOCVAULT_DOC_PASSWORD` or a prompt.
pub fn prompt_document_password(confirm: bool) -> Result<Zeroizing<String>> {
    if let Some(pw) = env_secret(DOC_PASSWORD_ENV) {
        return Ok(pw);
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Document password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    let pw = prompt
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    if pw.is_empty() {
        return Err(VaultError::CommandFailed(
            "document password cannot be empty".into(),
        ));
    }
    Ok(Zeroizing::new(pw))
}

fn env_secret(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(Zeroizing::new)
}
