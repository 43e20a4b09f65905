mod config;

pub use config::{Config, NotificationsConfig, ReminderConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/pawcue[-dev]/` based on PAWCUE_ENV.
///
/// Set PAWCUE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PAWCUE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pawcue-dev")
    } else {
        base_dir.join("pawcue")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
