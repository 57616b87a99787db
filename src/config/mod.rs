use std::env;
use std::path::PathBuf;

use crate::errors::AppError;

pub const DEFAULT_DATABASE_PATH: &str = "northwind.db";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
// 100KiB
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 102400;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub photo_dir: Option<PathBuf>,
    pub max_photo_bytes: usize,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    /// Call `dotenv().ok()` first so a `.env` file is honoured.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("DATABASE_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let bind_address = match lookup("BIND_ADDRESS") {
            Some(address) if address.trim().is_empty() => {
                return Err(AppError::ConfigError("BIND_ADDRESS cannot be empty".to_string()));
            }
            Some(address) => address,
            None => DEFAULT_BIND_ADDRESS.to_string(),
        };

        let photo_dir = lookup("PHOTO_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let max_photo_bytes = match lookup("MAX_PHOTO_BYTES") {
            Some(value) => value.trim().parse::<usize>().map_err(|err| {
                AppError::ConfigError(format!("MAX_PHOTO_BYTES must be a byte count: {}", err))
            })?,
            None => DEFAULT_MAX_PHOTO_BYTES,
        };

        Ok(AppConfig {
            database_path,
            bind_address,
            photo_dir,
            max_photo_bytes,
        })
    }
}
