//! `docvault edit`: change a document's fields.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::DocumentPatch;

/// Field changes requested on the command line.
pub struct EditArgs<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub category: Option<&'a str>,
    pub tags: &'a [String],
    pub important: bool,
    pub not_important: bool,
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, id: &str, args: &EditArgs<'_>) -> Result<()> {
    let patch = build_patch(args);
    if patch.is_empty() {
        return Err(VaultError::CommandFailed(
            "nothing to change — pass at least one of --title, --content, --category, --tag, --important, --not-important".into(),
        ));
    }

    let (repo, pin, _) = unlock_vault(cli)?;
    let doc = repo.update_document(&pin, id, &patch)?;

    output::success(&format!("Updated '{}'", doc.title));
    Ok(())
}

fn build_patch(args: &EditArgs<'_>) -> DocumentPatch {
    let is_important = if args.important {
        Some(true)
    } else if args.not_important {
        Some(false)
    } else {
        None
    };

    DocumentPatch {
        title: args.title.map(str::to_string),
        content: args.content.map(str::to_string),
        category: args.category.map(str::to_string),
        tags: (!args.tags.is_empty()).then(|| args.tags.to_vec()),
        is_important,
    }
}
