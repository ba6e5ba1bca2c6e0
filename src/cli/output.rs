//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{SecretDocument, VaultSettings};

/// Longest snippet shown in a table cell.
const TABLE_SNIPPET_CHARS: usize = 40;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of documents (Id, Title, Category, Tags, Flags, Preview, Updated).
pub fn print_documents_table(docs: &[SecretDocument], settings: &VaultSettings) {
    if docs.is_empty() {
        info("No documents in this vault yet.");
        tip("Run `docvault add --title <TITLE>` to add your first document.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Id", "Title", "Category", "Tags", "Flags", "Preview", "Updated",
    ]);

    for d in docs {
        table.add_row(vec![
            d.id.clone(),
            d.title.clone(),
            settings.category_name(&d.category).to_string(),
            d.tags.join(", "),
            flags(d),
            truncate(&d.display_snippet(), TABLE_SNIPPET_CHARS),
            d.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print one document's metadata followed by its content.
pub fn print_document(doc: &SecretDocument, content: &str, settings: &VaultSettings) {
    println!("{}", style(&doc.title).bold());
    println!(
        "{}",
        style(format!(
            "{}  |  {}  |  created {}  |  updated {}",
            doc.id,
            settings.category_name(&doc.category),
            doc.created_at.format("%Y-%m-%d %H:%M"),
            doc.updated_at.format("%Y-%m-%d %H:%M"),
        ))
        .dim()
    );
    if !doc.tags.is_empty() {
        println!("{}", style(format!("tags: {}", doc.tags.join(", "))).dim());
    }
    println!();
    println!("{content}");
}

/// Short flag column: `!` important, `P` password-protected.
fn flags(doc: &SecretDocument) -> String {
    let mut out = String::new();
    if doc.is_important {
        out.push('!');
    }
    if doc.has_password {
        out.push('P');
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut out: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_cuts_long_text_with_ellipsis() {
        let out = truncate("abcdefghijkl", 5);
        assert_eq!(out.chars().count(), 5);
        assert!(out.ends_with('\u{2026}'));
    }

    #[test]
    fn truncate_uses_first_line_only() {
        assert_eq!(truncate("first\nsecond", 40), "first");
    }
}
