//! `docvault list`: unlock the vault and show documents in a table.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::{sort_documents, SortKey};

/// Execute the `list` command.
pub fn execute(
    cli: &Cli,
    all: bool,
    sort: &str,
    ascending: bool,
    category: Option<&str>,
) -> Result<()> {
    let key = parse_sort(sort)?;
    let (repo, pin, unlocked) = unlock_vault(cli)?;

    let mut docs = if all {
        repo.list_documents(&pin, true)?
    } else {
        unlocked
    };

    if let Some(category) = category {
        docs.retain(|d| d.category == category);
    }
    sort_documents(&mut docs, key, !ascending);

    let settings = repo.settings()?;
    output::info(&format!("{} document(s)", docs.len()));
    output::print_documents_table(&docs, &settings);

    Ok(())
}

fn parse_sort(name: &str) -> Result<SortKey> {
    match name.to_lowercase().as_str() {
        "date" => Ok(SortKey::Date),
        "importance" => Ok(SortKey::Importance),
        other => Err(VaultError::CommandFailed(format!(
            "unknown sort '{other}' — use 'date' or 'importance'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sort_accepts_known_keys() {
        assert_eq!(parse_sort("date").unwrap(), SortKey::Date);
        assert_eq!(parse_sort("Importance").unwrap(), SortKey::Importance);
    }

    #[test]
    fn parse_sort_rejects_unknown() {
        assert!(parse_sort("title").is_err());
    }
}
