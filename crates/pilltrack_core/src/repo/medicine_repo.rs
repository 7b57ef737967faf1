//! Medicine repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over canonical `medicines` storage.
//!
//! # Invariants
//! - Write paths call `Medicine::validate()` before SQL mutations.
//! - Listing order is deterministic: `name COLLATE NOCASE ASC, uuid ASC`.

use super::{
    bool_to_int, ensure_connection_ready, parse_db_bool, parse_db_uuid, RepoError, RepoResult,
};
use crate::model::medicine::{Medicine, MedicineId};
use rusqlite::{params, Connection, Row};

const MEDICINE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    interval_days,
    is_deleted
FROM medicines";

/// Repository interface for medicine CRUD operations.
pub trait MedicineRepository {
    fn create_medicine(&self, medicine: &Medicine) -> RepoResult<MedicineId>;
    fn update_medicine(&self, medicine: &Medicine) -> RepoResult<()>;
    fn get_medicine(&self, id: MedicineId, include_deleted: bool) -> RepoResult<Option<Medicine>>;
    fn list_medicines(&self, include_deleted: bool) -> RepoResult<Vec<Medicine>>;
    fn soft_delete_medicine(&self, id: MedicineId) -> RepoResult<()>;
}

/// SQLite-backed medicine repository.
pub struct SqliteMedicineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMedicineRepository<'conn> {
    /// Creates a repository over a fully migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MedicineRepository for SqliteMedicineRepository<'_> {
    fn create_medicine(&self, medicine: &Medicine) -> RepoResult<MedicineId> {
        medicine.validate()?;

        self.conn.execute(
            "INSERT INTO medicines (uuid, name, interval_days, is_deleted)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                medicine.uuid.to_string(),
                medicine.name.trim(),
                medicine.interval_days,
                bool_to_int(medicine.is_deleted),
            ],
        )?;

        Ok(medicine.uuid)
    }

    fn update_medicine(&self, medicine: &Medicine) -> RepoResult<()> {
        medicine.validate()?;

        let changed = self.conn.execute(
            "UPDATE medicines
             SET
                name = ?1,
                interval_days = ?2,
                is_deleted = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                medicine.name.trim(),
                medicine.interval_days,
                bool_to_int(medicine.is_deleted),
                medicine.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::MedicineNotFound(medicine.uuid));
        }

        Ok(())
    }

    fn get_medicine(&self, id: MedicineId, include_deleted: bool) -> RepoResult<Option<Medicine>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEDICINE_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_medicine_row(row)?));
        }

        Ok(None)
    }

    fn list_medicines(&self, include_deleted: bool) -> RepoResult<Vec<Medicine>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEDICINE_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY name COLLATE NOCASE ASC, uuid ASC;"
        ))?;

        let mut rows = stmt.query([bool_to_int(include_deleted)])?;
        let mut medicines = Vec::new();
        while let Some(row) = rows.next()? {
            medicines.push(parse_medicine_row(row)?);
        }

        Ok(medicines)
    }

    fn soft_delete_medicine(&self, id: MedicineId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE medicines
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::MedicineNotFound(id));
        }

        Ok(())
    }
}

fn parse_medicine_row(row: &Row<'_>) -> RepoResult<Medicine> {
    let uuid_text: String = row.get("uuid")?;
    let interval: i64 = row.get("interval_days")?;
    let interval_days = u32::try_from(interval).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid interval `{interval}` in medicines.interval_days"
        ))
    })?;

    let medicine = Medicine {
        uuid: parse_db_uuid(&uuid_text, "medicines.uuid")?,
        name: row.get("name")?,
        interval_days,
        is_deleted: parse_db_bool(row.get("is_deleted")?, "medicines.is_deleted")?,
    };
    medicine.validate()?;
    Ok(medicine)
}
