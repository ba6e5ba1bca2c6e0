//! `docvault init`: set the PIN for a new vault.

use crate::cli::output;
use crate::cli::{data_path, open_repository, prompt_new_pin, Cli, PIN_ENV};
use crate::errors::{Result, VaultError};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let repo = open_repository(cli)?;

    // 1. Refuse to overwrite an existing PIN.
    if repo.credentials().has_pin_set()? {
        output::tip("Use `docvault pin change` to change the PIN.");
        return Err(VaultError::PinAlreadySet);
    }

    // 2. Choose a PIN that matches the stored (or default) settings.
    let settings = repo.settings()?;
    let pin = prompt_new_pin(PIN_ENV, &settings)?;

    // 3. Store its hash.
    repo.credentials().set_pin(&pin)?;

    let scope = if repo.is_local_only() {
        "local-only".to_string()
    } else {
        format!("user '{}'", repo.scope())
    };
    output::success(&format!(
        "Vault ready ({scope}) at {}",
        data_path(cli)?.display()
    ));

    output::tip("Run `docvault add --title <TITLE>` to add a document.");
    output::tip("Run `docvault list` to see your documents.");

    Ok(())
}
