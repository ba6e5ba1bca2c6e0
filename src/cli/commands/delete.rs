//! `docvault delete`: move documents to the trash.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, ids: &[String]) -> Result<()> {
    let (repo, _pin, docs) = unlock_vault(cli)?;

    for id in ids {
        if !docs.iter().any(|d| &d.id == id) {
            output::warning(&format!("No active document '{id}'"));
        }
    }

    repo.soft_delete(ids)?;
    output::success(&format!("Moved {} document(s) to the trash", ids.len()));
    output::tip("Run `docvault restore <ID>` to undo, or `docvault purge <ID>` to delete for good.");
    Ok(())
}
