//! `docvault export`: write a JSON backup of the vault.
//!
//! The backup holds unprotected content in plain text.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `export` command.
pub fn execute(cli: &Cli, output_path: Option<&str>) -> Result<()> {
    let (repo, pin, _) = unlock_vault(cli)?;
    let backup = repo.export_backup(&pin)?;
    let content = backup.to_json()?;

    match output_path {
        Some(dest) => {
            write_private(Path::new(dest), &content)?;
            output::success(&format!(
                "Exported {} document(s) to {dest}",
                backup.docs.len()
            ));
            output::warning("The backup contains unprotected documents in plain text.");
        }
        None => {
            // Write to stdout (no success message, just raw output).
            println!("{content}");
        }
    }

    Ok(())
}

fn write_private(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .map_err(|e| VaultError::CommandFailed(format!("failed to write export file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
