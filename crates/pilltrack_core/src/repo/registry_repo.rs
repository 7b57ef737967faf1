//! Registry entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the dated yes/no log for each medicine.
//! - Provide date-range reads used by period reconciliation.
//! - Decide and apply period writes (insert, reject, overwrite) atomically.
//!
//! # Invariants
//! - Entries are stored with day-granularity `entry_date` text (`YYYY-MM-DD`).
//! - Ascending order is `entry_date, recorded_at, uuid`; it matches
//!   `RegistryEntry::cmp_recency`.
//! - Inserts require an active medicine.
//! - A period write reads its window and writes inside one `IMMEDIATE`
//!   transaction; an overwrite leaves exactly one entry in the window.

use super::{
    bool_to_int, date_to_db, ensure_connection_ready, parse_db_bool, parse_db_date, parse_db_uuid,
    RepoError, RepoResult,
};
use crate::model::medicine::MedicineId;
use crate::model::registry::{RegistryEntry, RegistryEntryId};
use crate::period::{self, PeriodWindow};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const ENTRY_SELECT_SQL: &str = "SELECT
    uuid,
    medicine_uuid,
    entry_date,
    taken,
    recorded_at
FROM registry_entries";

/// Query options for listing one medicine's entries.
#[derive(Debug, Clone)]
pub struct RegistryListQuery {
    pub medicine_id: MedicineId,
    /// Inclusive lower date bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub to: Option<NaiveDate>,
    pub taken: Option<bool>,
    /// Returns most recent entries first when set.
    pub newest_first: bool,
    pub limit: Option<u32>,
}

impl RegistryListQuery {
    /// Lists every entry of one medicine in ascending order.
    pub fn all(medicine_id: MedicineId) -> Self {
        Self {
            medicine_id,
            from: None,
            to: None,
            taken: None,
            newest_first: false,
            limit: None,
        }
    }

    pub fn between(medicine_id: MedicineId, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::all(medicine_id)
        }
    }
}

/// Result of `RegistryRepository::record_in_period`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodWrite {
    /// The window was empty; the entry was stored.
    Inserted,
    /// Every entry previously in the window, ascending, now deleted.
    Replaced(Vec<RegistryEntry>),
    /// Authoritative entry already covering the window; nothing was written.
    Conflict(RegistryEntry),
}

/// Repository interface for registry log operations.
pub trait RegistryRepository {
    fn insert_entry(&self, entry: &RegistryEntry) -> RepoResult<RegistryEntryId>;
    fn get_entry(&self, id: RegistryEntryId) -> RepoResult<Option<RegistryEntry>>;
    fn list_entries(&self, query: &RegistryListQuery) -> RepoResult<Vec<RegistryEntry>>;
    fn delete_entry(&self, id: RegistryEntryId) -> RepoResult<()>;
    /// Stores `entry` unless its period window is already covered.
    ///
    /// With `overwrite` set, every entry in the window is deleted first.
    fn record_in_period(
        &self,
        entry: &RegistryEntry,
        interval_days: u32,
        overwrite: bool,
    ) -> RepoResult<PeriodWrite>;
}

/// SQLite-backed registry repository.
pub struct SqliteRegistryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegistryRepository<'conn> {
    /// Creates a repository over a fully migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RegistryRepository for SqliteRegistryRepository<'_> {
    fn insert_entry(&self, entry: &RegistryEntry) -> RepoResult<RegistryEntryId> {
        entry.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_medicine_active(&tx, entry.medicine_id)?;
        insert_entry_in_tx(&tx, entry)?;
        tx.commit()?;

        Ok(entry.uuid)
    }

    fn get_entry(&self, id: RegistryEntryId) -> RepoResult<Option<RegistryEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }

        Ok(None)
    }

    fn list_entries(&self, query: &RegistryListQuery) -> RepoResult<Vec<RegistryEntry>> {
        query_entries(self.conn, query)
    }

    fn delete_entry(&self, id: RegistryEntryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM registry_entries WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::EntryNotFound(id));
        }
        Ok(())
    }

    fn record_in_period(
        &self,
        entry: &RegistryEntry,
        interval_days: u32,
        overwrite: bool,
    ) -> RepoResult<PeriodWrite> {
        entry.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_medicine_active(&tx, entry.medicine_id)?;

        let window = PeriodWindow::around(entry.date, interval_days);
        let in_window = query_entries(
            &tx,
            &RegistryListQuery::between(entry.medicine_id, window.start, window.end),
        )?;
        let conflict = period::find_conflict(&in_window, entry.date, interval_days).cloned();

        let write = match conflict {
            None => PeriodWrite::Inserted,
            // Dropping `tx` rolls back; nothing was written yet.
            Some(existing) if !overwrite => return Ok(PeriodWrite::Conflict(existing)),
            Some(_) => {
                let removed = tx.execute(
                    "DELETE FROM registry_entries
                     WHERE medicine_uuid = ?1 AND entry_date >= ?2 AND entry_date <= ?3;",
                    params![
                        entry.medicine_id.to_string(),
                        date_to_db(window.start),
                        date_to_db(window.end),
                    ],
                )?;
                if removed != in_window.len() {
                    return Err(RepoError::InvalidData(format!(
                        "period overwrite removed {removed} rows, expected {}",
                        in_window.len()
                    )));
                }
                PeriodWrite::Replaced(in_window)
            }
        };

        insert_entry_in_tx(&tx, entry)?;
        tx.commit()?;

        Ok(write)
    }
}

fn query_entries(conn: &Connection, query: &RegistryListQuery) -> RepoResult<Vec<RegistryEntry>> {
    let mut sql = format!("{ENTRY_SELECT_SQL} WHERE medicine_uuid = ?");
    let mut bind_values: Vec<Value> = vec![Value::Text(query.medicine_id.to_string())];

    if let Some(from) = query.from {
        sql.push_str(" AND entry_date >= ?");
        bind_values.push(Value::Text(date_to_db(from)));
    }
    if let Some(to) = query.to {
        sql.push_str(" AND entry_date <= ?");
        bind_values.push(Value::Text(date_to_db(to)));
    }
    if let Some(taken) = query.taken {
        sql.push_str(" AND taken = ?");
        bind_values.push(Value::Integer(bool_to_int(taken)));
    }

    if query.newest_first {
        sql.push_str(" ORDER BY entry_date DESC, recorded_at DESC, uuid DESC");
    } else {
        sql.push_str(" ORDER BY entry_date ASC, recorded_at ASC, uuid ASC");
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_entry_row(row)?);
    }

    Ok(entries)
}

fn ensure_medicine_active(tx: &Transaction<'_>, medicine_id: MedicineId) -> RepoResult<()> {
    let medicine_active: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM medicines WHERE uuid = ?1 AND is_deleted = 0
        );",
        [medicine_id.to_string()],
        |row| row.get(0),
    )?;
    if medicine_active != 1 {
        return Err(RepoError::MedicineNotFound(medicine_id));
    }
    Ok(())
}

fn insert_entry_in_tx(tx: &Transaction<'_>, entry: &RegistryEntry) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO registry_entries (
            uuid,
            medicine_uuid,
            entry_date,
            taken,
            recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            entry.uuid.to_string(),
            entry.medicine_id.to_string(),
            date_to_db(entry.date),
            bool_to_int(entry.taken),
            entry.recorded_at,
        ],
    )?;
    Ok(())
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<RegistryEntry> {
    let uuid_text: String = row.get("uuid")?;
    let medicine_text: String = row.get("medicine_uuid")?;
    let date_text: String = row.get("entry_date")?;

    let entry = RegistryEntry {
        uuid: parse_db_uuid(&uuid_text, "registry_entries.uuid")?,
        medicine_id: parse_db_uuid(&medicine_text, "registry_entries.medicine_uuid")?,
        date: parse_db_date(&date_text, "registry_entries.entry_date")?,
        taken: parse_db_bool(row.get("taken")?, "registry_entries.taken")?,
        recorded_at: row.get("recorded_at")?,
    };
    entry.validate()?;
    Ok(entry)
}
