//! `docvault restore`: bring documents back from the trash.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `restore` command.
pub fn execute(cli: &Cli, ids: &[String]) -> Result<()> {
    let (repo, _pin, _) = unlock_vault(cli)?;
    repo.restore(ids)?;
    output::success(&format!("Restored {} document(s)", ids.len()));
    Ok(())
}
