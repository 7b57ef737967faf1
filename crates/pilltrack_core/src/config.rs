//! Environment-driven core configuration.
//!
//! # Responsibility
//! - Resolve database path and logging settings for embedding shells.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never fails; invalid log levels surface at `init_logging`.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "PILLTRACK_DB_PATH";
pub const LOG_DIR_ENV: &str = "PILLTRACK_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "PILLTRACK_LOG_LEVEL";
pub const DEFAULT_DB_FILE_NAME: &str = "pilltrack.sqlite3";

/// Resolved settings shared by FFI and CLI entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// Absolute directory for rolling log files; logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_dir: non_blank(LOG_DIR_ENV).map(PathBuf::from),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
        }
    }
}
