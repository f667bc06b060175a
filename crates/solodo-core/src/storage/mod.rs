mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, NotificationsConfig, TimerConfig};
pub use database::{Database, StudyLog, Tag};

use std::path::PathBuf;

/// Returns `~/.config/solodo[-dev]/` based on SOLODO_ENV.
///
/// Set SOLODO_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SOLODO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("solodo-dev")
    } else {
        base_dir.join("solodo")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
