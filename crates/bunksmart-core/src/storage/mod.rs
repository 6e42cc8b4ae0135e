mod config;
pub mod database;
pub mod session;

pub use config::{Config, StoreBackend, StoreConfig, UiConfig, CONFIG_FILE_NAME};
pub use database::{Database, DocumentField, DB_FILE_NAME};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Overrides the data directory entirely.
pub const DATA_DIR_ENV: &str = "BUNKSMART_DATA_DIR";
/// `dev` selects the development data directory.
pub const ENV_ENV: &str = "BUNKSMART_ENV";

/// Returns the data directory, creating it if needed.
///
/// `$BUNKSMART_DATA_DIR` when set, otherwise `~/.config/bunksmart[-dev]/`
/// depending on `BUNKSMART_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var(ENV_ENV).unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("bunksmart-dev")
            } else {
                base_dir.join("bunksmart")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
