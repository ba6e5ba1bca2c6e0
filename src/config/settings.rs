use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{Pbkdf2Params, DEFAULT_ITERATIONS};
use crate::errors::{Result, VaultError};

/// Project-level configuration, loaded from `.docvault.toml`.
///
/// Every field has a default, so DocVault works without any config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to the project root) for the on-device store.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory acting as the remote tier, e.g. a synced or mounted
    /// folder.  Only used when a user is set.
    #[serde(default)]
    pub remote_dir: Option<String>,

    /// Signed-in user.  Without one the vault is local-only.
    #[serde(default)]
    pub user: Option<String>,

    /// PBKDF2 iteration count.  Must not change once a vault has data.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_data_dir() -> String {
    ".docvault".to_string()
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote_dir: None,
            user: None,
            kdf_iterations: default_kdf_iterations(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".docvault.toml";

    /// Load settings from `<project_dir>/.docvault.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Directory of the on-device store.
    ///
    /// Example: `project_dir/.docvault`
    pub fn data_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.data_dir)
    }

    /// Directory of the remote tier, if one is configured.
    pub fn remote_path(&self, project_dir: &Path) -> Option<PathBuf> {
        self.remote_dir.as_ref().map(|dir| project_dir.join(dir))
    }

    /// Convert the KDF settings into crypto-layer params.
    pub fn pbkdf2_params(&self) -> Pbkdf2Params {
        Pbkdf2Params {
            iterations: self.kdf_iterations,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
