//! `docvault show`: print one document.
//!
//! Password-protected documents ask for their password.  `--use-pin`
//! opens them with the vault PIN alone, which is weaker than the
//! document password, so the command says so every time.

use crate::cli::output;
use crate::cli::{prompt_document_password, unlock_vault, Cli};
use crate::errors::Result;
use crate::vault::UnlockPath;

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: &str, use_pin: bool) -> Result<()> {
    let (repo, pin, _) = unlock_vault(cli)?;
    let doc = repo.get_document(&pin, id)?;

    let unlocked = if !doc.has_password {
        repo.unlock_document(&pin, id, "")?
    } else if use_pin {
        repo.unlock_document_with_pin(&pin, id)?
    } else {
        let password = prompt_document_password(false)?;
        repo.unlock_document(&pin, id, &password)?
    };

    if unlocked.path == UnlockPath::PinOverride {
        output::warning(
            "Opened with the vault PIN. Anyone who knows the PIN can read this document.",
        );
    }

    let settings = repo.settings()?;
    output::print_document(&doc, &unlocked.content, &settings);
    Ok(())
}
