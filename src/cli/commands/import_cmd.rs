//! `docvault import`: load documents from a JSON backup.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::{Backup, ImportMode};

/// Execute the `import` command.
pub fn execute(cli: &Cli, file_path: &str, replace: bool) -> Result<()> {
    let source = Path::new(file_path);

    if !source.exists() {
        return Err(VaultError::CommandFailed(format!(
            "import file not found: {}",
            source.display()
        )));
    }

    let json = fs::read_to_string(source)?;
    let backup = Backup::from_json(&json)?;

    if backup.docs.is_empty() {
        output::warning("No documents found in the backup.");
        return Ok(());
    }

    let (repo, pin, _) = unlock_vault(cli)?;
    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };
    let summary = repo.import_backup(&pin, &backup, mode)?;

    output::success(&format!(
        "Imported {} new and {} replaced document(s) from {}",
        summary.added,
        summary.replaced,
        source.display()
    ));
    if summary.removed > 0 {
        output::info(&format!(
            "Removed {} document(s) not in the backup",
            summary.removed
        ));
    }

    Ok(())
}
