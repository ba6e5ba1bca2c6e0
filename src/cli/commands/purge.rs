//! `docvault purge`: permanently delete documents.
//!
//! Connected vaults erase the records on the next unlock; local-only
//! vaults erase them right away.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `purge` command.
pub fn execute(cli: &Cli, ids: &[String], force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete {} document(s)? This cannot be undone.",
                ids.len()
            ))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let (repo, _pin, _) = unlock_vault(cli)?;
    repo.request_permanent_delete(ids)?;

    if repo.is_local_only() {
        output::success(&format!("Deleted {} document(s)", ids.len()));
    } else {
        output::success(&format!(
            "Scheduled {} document(s) for erasure on next unlock",
            ids.len()
        ));
    }
    Ok(())
}
