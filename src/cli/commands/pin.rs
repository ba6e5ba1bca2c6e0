//! `docvault pin`: change or reset the vault PIN.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_repository, prompt_new_pin, prompt_pin, Cli, NEW_PIN_ENV};
use crate::crypto::generate_temp_pin;
use crate::errors::{Result, VaultError};

/// Execute `pin change`: verify the current PIN, then re-encrypt every
/// document under the new one.
pub fn execute_change(cli: &Cli) -> Result<()> {
    let repo = open_repository(cli)?;
    if !repo.credentials().has_pin_set()? {
        return Err(VaultError::NoPinSet);
    }

    let current = prompt_pin()?;
    if !repo.credentials().verify_pin(&current)? {
        return Err(VaultError::Authentication);
    }

    let settings = repo.settings()?;
    let new_pin = prompt_new_pin(NEW_PIN_ENV, &settings)?;
    if new_pin.as_str() == current.as_str() {
        output::info("New PIN is the same as the current one. Nothing to do.");
        return Ok(());
    }

    let count = repo.change_pin(&current, &new_pin)?;
    output::success(&format!("PIN changed; {count} document(s) re-encrypted"));
    Ok(())
}

/// Execute `pin reset`: forget the PIN and issue a temporary one.
///
/// Documents encrypted under the old PIN stay unreadable unless the old
/// PIN is set again.
pub fn execute_reset(cli: &Cli, force: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Reset the PIN? Documents under the old PIN will be unreadable.")
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let repo = open_repository(cli)?;
    repo.credentials().reset_pin()?;

    let temp = generate_temp_pin();
    repo.credentials().set_pin(&temp)?;

    output::warning("PIN reset. Documents encrypted under the old PIN can no longer be read.");
    output::success(&format!("Temporary PIN: {temp}"));
    output::tip("Run `docvault pin change` to choose your own PIN.");
    Ok(())
}
