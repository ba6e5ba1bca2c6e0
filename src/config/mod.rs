//! Project configuration (`.docvault.toml`).

pub mod settings;

pub use settings::Settings;
