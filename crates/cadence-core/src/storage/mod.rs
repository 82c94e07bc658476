mod config;
mod memory;
mod sqlite;
mod store;

pub use config::{Config, CooldownConfig, DisplayConfig, NoticeConfig, PromptsConfig, SelfieConfig};
pub use memory::MemoryJournalStore;
pub use sqlite::SqliteJournalStore;
pub use store::JournalStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/cadence[-dev]/` based on CADENCE_ENV.
///
/// Set CADENCE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("cadence-dev")
    } else {
        base_dir.join("cadence")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
