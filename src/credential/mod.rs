//! Vault PIN storage and verification.
//!
//! Only the salted hash of the PIN is persisted, through the same backend
//! as the documents.  A missing credential simply means "no PIN set".

use std::sync::Arc;

use crate::crypto::{hash_secret, verify_secret};
use crate::errors::{Result, VaultError};
use crate::storage::PersistenceBackend;
use crate::vault::VaultSettings;

pub struct CredentialStore {
    backend: Arc<dyn PersistenceBackend>,
    scope: String,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn PersistenceBackend>, scope: impl Into<String>) -> Self {
        Self {
            backend,
            scope: scope.into(),
        }
    }

    pub fn has_pin_set(&self) -> Result<bool> {
        Ok(self.backend.get_credential(&self.scope)?.is_some())
    }

    /// Store the hash of `pin`, replacing any previous one.
    pub fn set_pin(&self, pin: &str) -> Result<()> {
        let hash = hash_secret(pin);
        self.backend.set_credential(&self.scope, Some(&hash))?;
        tracing::debug!(scope = %self.scope, "vault PIN stored");
        Ok(())
    }

    /// `false` when no PIN is set.
    pub fn verify_pin(&self, pin: &str) -> Result<bool> {
        Ok(match self.backend.get_credential(&self.scope)? {
            Some(stored) => verify_secret(pin, &stored),
            None => false,
        })
    }

    /// Verify `pin`, mapping a mismatch to `Authentication` and a missing
    /// credential to `NoPinSet`.
    pub fn require_pin(&self, pin: &str) -> Result<()> {
        let Some(stored) = self.backend.get_credential(&self.scope)? else {
            return Err(VaultError::NoPinSet);
        };
        if verify_secret(pin, &stored) {
            Ok(())
        } else {
            Err(VaultError::Authentication)
        }
    }

    /// Replace the PIN hash after checking `old`.
    ///
    /// This only touches the credential: documents still encrypted under
    /// `old` stop opening once it returns.  Outside the crate, change the
    /// PIN through `VaultRepository::change_pin`, which re-encrypts them
    /// first.
    pub(crate) fn change_pin(&self, old: &str, new: &str) -> Result<()> {
        self.require_pin(old)?;
        self.set_pin(new)
    }

    /// Forget the PIN.  Documents encrypted under it stay unreadable until
    /// the old PIN is used again.
    pub fn reset_pin(&self) -> Result<()> {
        self.backend.set_credential(&self.scope, None)?;
        tracing::warn!(scope = %self.scope, "vault PIN cleared");
        Ok(())
    }
}

/// Check a candidate PIN: ASCII digits only, exactly the length the vault
/// settings ask for (4 or 6).
pub fn validate_pin(pin: &str, settings: &VaultSettings) -> Result<()> {
    if pin.is_empty() {
        return Err(VaultError::InvalidPin("PIN cannot be empty".into()));
    }
    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VaultError::InvalidPin("PIN must contain digits only".into()));
    }
    if pin.len() != 4 && pin.len() != 6 {
        return Err(VaultError::InvalidPin("PIN must be 4 or 6 digits".into()));
    }
    if pin.len() != settings.pin_length {
        return Err(VaultError::InvalidPin(format!(
            "PIN must be {} digits",
            settings.pin_length
        )));
    }
    Ok(())
}
