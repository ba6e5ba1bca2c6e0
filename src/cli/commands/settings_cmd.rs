//! `docvault settings`: show or change vault settings.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `settings` command.
pub fn execute(cli: &Cli, auto_lock: Option<u32>, pin_length: Option<usize>) -> Result<()> {
    let (repo, _pin, _) = unlock_vault(cli)?;
    let mut settings = repo.settings()?;

    if auto_lock.is_some() || pin_length.is_some() {
        if let Some(minutes) = auto_lock {
            settings.auto_lock_minutes = minutes;
        }
        if let Some(len) = pin_length {
            settings.pin_length = len;
        }
        repo.save_settings(&settings)?;
        output::success("Settings saved");
    }

    println!("pin length:       {}", settings.pin_length);
    if settings.auto_lock_minutes == 0 {
        println!("auto-lock:        off");
    } else {
        println!("auto-lock:        {} min", settings.auto_lock_minutes);
    }
    println!("categories:");
    for (id, name) in &settings.category_names {
        println!("  {id:<12} {name}");
    }
    Ok(())
}
