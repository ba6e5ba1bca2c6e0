use thiserror::Error;

/// All errors that can occur in DocVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Access errors ---
    #[error("Authentication failed — incorrect PIN or password")]
    Authentication,

    #[error("Malformed encoded data: {0}")]
    Format(String),

    #[error("Vault is locked — unlock it with your PIN first")]
    Locked,

    #[error("No PIN has been set for this vault (run `docvault init`)")]
    NoPinSet,

    #[error("A PIN is already set for this vault")]
    PinAlreadySet,

    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    #[error("PIN mismatch — PINs do not match")]
    PinMismatch,

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Document errors ---
    #[error("Document '{0}' not found")]
    NotFound(String),

    #[error("Document '{0}' is already password-protected")]
    AlreadyProtected(String),

    // --- Storage errors ---
    #[error("Storage backend unavailable: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl VaultError {
    /// Errors that gate access to secrets.
    ///
    /// Callers showing messages to a user should collapse these into one
    /// generic "incorrect" message so a malformed record and a wrong PIN
    /// look the same from the outside.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Authentication | Self::Format(_))
    }
}

/// Convenience type alias for DocVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
