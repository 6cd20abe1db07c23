//! Environment-driven startup configuration.

use deskfolio_core::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "DESKFOLIO_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "DESKFOLIO_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DESKFOLIO_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "deskfolio.sqlite3";

/// Resolved startup settings for one `DeskApi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl ApiConfig {
    /// Reads `DESKFOLIO_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`; blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV),
        }
    }
}
