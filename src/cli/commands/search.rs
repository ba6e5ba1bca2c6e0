//! `docvault search`: find documents by title, tag or content.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `search` command.
pub fn execute(cli: &Cli, query: &str) -> Result<()> {
    let (repo, pin, _) = unlock_vault(cli)?;
    let found = repo.search_documents(&pin, query)?;

    output::info(&format!("{} match(es) for '{query}'", found.len()));
    if !found.is_empty() {
        output::print_documents_table(&found, &repo.settings()?);
    }
    Ok(())
}
