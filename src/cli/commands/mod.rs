//! One module per subcommand.  Each exposes an `execute` function.

pub mod add;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod export;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod pin;
pub mod protect;
pub mod purge;
pub mod restore;
pub mod search;
pub mod settings_cmd;
pub mod show;
pub mod unprotect;
pub mod version;
