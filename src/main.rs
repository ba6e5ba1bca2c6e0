use clap::Parser;
use tracing_subscriber::EnvFilter;

use docvault::cli::commands::{
    add, completions, delete, edit, export, import_cmd, init, list, pin, protect, purge, restore,
    search, settings_cmd, show, unprotect, version,
};
use docvault::cli::{output, Cli, Commands, PinAction};

/// Environment variable holding the log filter (e.g. `debug`, `docvault=info`).
const LOG_ENV: &str = "DOCVAULT_LOG";

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => init::execute(&cli),
        Commands::List {
            all,
            ref sort,
            asc,
            ref category,
        } => list::execute(&cli, all, sort, asc, category.as_deref()),
        Commands::Add {
            ref title,
            ref category,
            ref tags,
            important,
            ref content,
        } => add::execute(
            &cli,
            title,
            category.as_deref(),
            tags,
            important,
            content.as_deref(),
        ),
        Commands::Show { ref id, use_pin } => show::execute(&cli, id, use_pin),
        Commands::Edit {
            ref id,
            ref title,
            ref content,
            ref category,
            ref tags,
            important,
            not_important,
        } => edit::execute(
            &cli,
            id,
            &edit::EditArgs {
                title: title.as_deref(),
                content: content.as_deref(),
                category: category.as_deref(),
                tags,
                important,
                not_important,
            },
        ),
        Commands::Delete { ref ids } => delete::execute(&cli, ids),
        Commands::Restore { ref ids } => restore::execute(&cli, ids),
        Commands::Purge { ref ids, force } => purge::execute(&cli, ids, force),
        Commands::Protect { ref id } => protect::execute(&cli, id),
        Commands::Unprotect { ref id } => unprotect::execute(&cli, id),
        Commands::Pin { ref action } => match action {
            PinAction::Change => pin::execute_change(&cli),
            PinAction::Reset { force } => pin::execute_reset(&cli, *force),
        },
        Commands::Search { ref query } => search::execute(&cli, query),
        Commands::Export { ref output } => export::execute(&cli, output.as_deref()),
        Commands::Import { ref file, replace } => import_cmd::execute(&cli, file, replace),
        Commands::Settings {
            auto_lock,
            pin_length,
        } => settings_cmd::execute(&cli, auto_lock, pin_length),
        Commands::Completions { shell } => completions::execute(shell),
        Commands::Version => version::execute(),
    };

    if let Err(e) = result {
        // A wrong PIN and a corrupted record look the same from outside.
        if e.is_access_denied() {
            output::error("Incorrect PIN or password");
        } else {
            output::error(&e.to_string());
        }
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `DOCVAULT_LOG` (default: warn).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
