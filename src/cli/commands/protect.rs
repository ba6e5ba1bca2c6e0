//! `docvault protect`: give a document its own password.

use crate::cli::output;
use crate::cli::{prompt_document_password, unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `protect` command.
pub fn execute(cli: &Cli, id: &str) -> Result<()> {
    let (repo, pin, _) = unlock_vault(cli)?;
    let password = prompt_document_password(true)?;
    let doc = repo.set_document_password(&pin, id, &password)?;

    output::success(&format!("'{}' is now password-protected", doc.title));
    output::tip("The vault PIN can still open it with `docvault show <ID> --use-pin`.");
    Ok(())
}
