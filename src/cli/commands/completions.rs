//! `docvault completions`: generate shell completion scripts.
//!
//! Usage:
//!   docvault completions bash > ~/.local/share/bash-completion/completions/docvault
//!   docvault completions zsh > "${fpath[1]}/_docvault"
//!   docvault completions fish > ~/.config/fish/completions/docvault.fish

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    use super::*;

    fn parse(shell: &str) -> Option<Shell> {
        match Cli::try_parse_from(["docvault", "completions", shell]).ok()?.command {
            Commands::Completions { shell } => Some(shell),
            _ => None,
        }
    }

    #[test]
    fn known_shells_parse() {
        assert_eq!(parse("bash"), Some(Shell::Bash));
        assert_eq!(parse("zsh"), Some(Shell::Zsh));
        assert_eq!(parse("fish"), Some(Shell::Fish));
        assert_eq!(parse("powershell"), Some(Shell::PowerShell));
    }

    #[test]
    fn unknown_shell_is_rejected() {
        assert_eq!(parse("csh"), None);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
