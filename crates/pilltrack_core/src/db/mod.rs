//! SQLite storage for medicines and the registry log.
//!
//! # Responsibility
//! - Open connections with the pragmas registry storage relies on.
//! - Bring the schema to the version this binary understands.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version` and only moves forward.
//! - A database written by a newer binary is refused, never downgraded.
//! - Callers receive a connection only after every pending migration committed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage bootstrap failures.
#[derive(Debug)]
pub enum DbError {
    /// Transport-level SQLite failure outside a migration step.
    Sqlite(rusqlite::Error),
    /// File schema is ahead of this binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// One migration step failed; the whole upgrade was rolled back.
    MigrationFailed {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// Migration table is not strictly increasing.
    MigrationOrder { previous: u32, version: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "registry database is at schema {db_version}, this build reads up to {latest_supported}"
            ),
            Self::MigrationFailed {
                version,
                name,
                source,
            } => write!(f, "migration {version} ({name}) failed: {source}"),
            Self::MigrationOrder { previous, version } => write!(
                f,
                "migration {version} is registered after {previous}; versions must increase"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::MigrationOrder { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
