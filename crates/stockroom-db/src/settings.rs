//! # Settings
//!
//! Loads database settings from layered sources.
//!
//! ## Sources (Priority Order)
//! 1. Environment variables (`STOCKROOM_DATABASE_PATH`, `STOCKROOM_MAX_CONNECTIONS`, ...)
//! 2. Config file (`stockroom.toml`, optional)
//! 3. Defaults (this file)
//!
//! Finding a per-user data directory is left to the host application; it
//! passes the resulting path in through either source.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DbResult;
use crate::pool::DbConfig;

/// Prefix of every environment variable read by [`Settings::load`].
pub const ENV_PREFIX: &str = "STOCKROOM";

/// Default config file, looked up relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "stockroom.toml";

/// Store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file.
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub busy_timeout_ms: u64,
    /// Provision schema and bootstrap user on connect.
    pub run_migrations: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: PathBuf::from("store.db"),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 30,
            busy_timeout_ms: 5_000,
            run_migrations: true,
        }
    }
}

impl Settings {
    /// Loads settings from [`DEFAULT_CONFIG_FILE`] and the environment.
    pub fn load() -> DbResult<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads settings from `path` (optional, any format `config` knows by
    /// extension) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> DbResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Converts to the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .run_migrations(self.run_migrations)
    }
}
