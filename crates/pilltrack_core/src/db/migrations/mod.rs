//! Schema upgrades for the registry database.
//!
//! # Responsibility
//! - List named schema steps in the order they were released.
//! - Apply every pending step in one transaction and record the version.
//!
//! # Invariants
//! - Step versions strictly increase; `apply_migrations` refuses a table
//!   that breaks this before touching the database.
//! - A failing step rolls back all steps of the same upgrade.
//! - Released SQL files are append-only.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "medicines_and_registry",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "medicine_name_index",
        sql: include_str!("0002_medicine_name_index.sql"),
    },
];

/// Returns the newest schema version this binary can write.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |step| step.version)
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Upgrades `conn` to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is newer than this binary.
/// - `MigrationFailed` naming the first step that did not apply.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    upgrade(conn, MIGRATIONS)
}

fn upgrade(conn: &mut Connection, steps: &[Migration]) -> DbResult<()> {
    check_order(steps)?;

    let from_version = current_user_version(conn)?;
    let target = steps.last().map_or(0, |step| step.version);
    if from_version > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: target,
        });
    }

    let pending: Vec<&Migration> = steps
        .iter()
        .filter(|step| step.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        let applied = tx
            .execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version));
        if let Err(source) = applied {
            error!(
                "event=db_migrate module=db status=error version={} name={}",
                step.version, step.name
            );
            return Err(DbError::MigrationFailed {
                version: step.version,
                name: step.name,
                source,
            });
        }
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=done from_version={from_version} to_version={target}");
    Ok(())
}

fn check_order(steps: &[Migration]) -> DbResult<()> {
    let mut previous = 0;
    for step in steps {
        if step.version <= previous {
            return Err(DbError::MigrationOrder {
                previous,
                version: step.version,
            });
        }
        previous = step.version;
    }
    Ok(())
}
