//! `docvault add`: add a document.

use std::io::{IsTerminal, Read};

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::NewDocument;

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    title: &str,
    category: Option<&str>,
    tags: &[String],
    important: bool,
    content: Option<&str>,
) -> Result<()> {
    if title.trim().is_empty() {
        return Err(VaultError::CommandFailed("title cannot be empty".into()));
    }

    let (repo, pin, _) = unlock_vault(cli)?;

    // Content from --content, else piped stdin, else an interactive prompt.
    let content = match content {
        Some(c) => c.to_string(),
        None => read_content()?,
    };

    let doc = repo.add_document(
        &pin,
        NewDocument {
            title: title.to_string(),
            content,
            category: category.map(str::to_string),
            tags: tags.to_vec(),
            is_important: important,
        },
    )?;

    output::success(&format!("Added '{}' ({})", doc.title, doc.id));
    Ok(())
}

fn read_content() -> Result<String> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        let mut buf = String::new();
        stdin.lock().read_to_string(&mut buf)?;
        return Ok(buf.trim_end_matches('\n').to_string());
    }

    dialoguer::Input::<String>::new()
        .with_prompt("Content")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| VaultError::CommandFailed(format!("content prompt: {e}")))
}
