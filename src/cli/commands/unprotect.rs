//! `docvault unprotect`: remove a document's password.

use crate::cli::output;
use crate::cli::{prompt_document_password, unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `unprotect` command.
pub fn execute(cli: &Cli, id: &str) -> Result<()> {
    let (repo, pin, _) = unlock_vault(cli)?;
    let password = prompt_document_password(false)?;
    let doc = repo.remove_document_password(&pin, id, &password)?;

    output::success(&format!("Removed the password from '{}'", doc.title));
    Ok(())
}
