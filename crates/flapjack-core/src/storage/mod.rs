mod config;
pub mod database;

pub use config::{AdminConfig, Config, DisplayConfig, StoreConfig, UserConfig};
pub use database::Database;

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `FLAPJACK_HOME` wins when set. Otherwise `~/.config/flapjack[-dev]/`
/// based on `FLAPJACK_ENV`; set `FLAPJACK_ENV=dev` to use the development
/// directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FLAPJACK_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FLAPJACK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("flapjack-dev")
            } else {
                base_dir.join("flapjack")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
