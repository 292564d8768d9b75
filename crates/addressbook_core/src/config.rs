//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Resolution never fails; every field has a default.

use crate::logging::default_log_level;
use crate::store::persistence::DEFAULT_STORAGE_KEY;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "ADDRESSBOOK_DB_PATH";
pub const STORAGE_KEY_ENV: &str = "ADDRESSBOOK_STORAGE_KEY";
pub const LOG_LEVEL_ENV: &str = "ADDRESSBOOK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "ADDRESSBOOK_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "addressbook.sqlite3";
const DATA_DIR_NAME: &str = "addressbook";

/// Default database location under the user's local data directory.
///
/// Falls back to the working directory when the platform reports none.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(DATA_DIR_NAME).join(DEFAULT_DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME))
}

/// Settings for opening a persisted address book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Key under which the collection is stored.
    pub storage_key: String,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; file logging is off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads `ADDRESSBOOK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            var(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: read(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            storage_key: read(STORAGE_KEY_ENV).unwrap_or(defaults.storage_key),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}
