//! Registry entry model.
//!
//! # Responsibility
//! - Represent one dated record of whether a dose was taken.
//! - Define the ordering that makes one entry authoritative over another.
//!
//! # Invariants
//! - `date` has day granularity; time-of-day never participates in matching.
//! - `recorded_at` is insertion time in epoch milliseconds.

use super::medicine::MedicineId;
use super::ModelValidationError;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Stable identifier for one registry entry.
pub type RegistryEntryId = Uuid;

/// One dated yes/no dose record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub uuid: RegistryEntryId,
    pub medicine_id: MedicineId,
    /// Calendar day the dose refers to.
    pub date: NaiveDate,
    /// Whether the medicine was taken on/around `date`.
    pub taken: bool,
    /// Unix epoch milliseconds when the entry was logged.
    pub recorded_at: i64,
}

impl RegistryEntry {
    /// Creates a new entry stamped with the current time.
    pub fn new(medicine_id: MedicineId, date: NaiveDate, taken: bool) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            medicine_id,
            date,
            taken,
            recorded_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.uuid.is_nil() || self.medicine_id.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }
        Ok(())
    }

    /// Orders entries by recency: date, then log time, then id.
    ///
    /// `Ordering::Greater` means `self` is more recent than `other`.
    pub fn cmp_recency(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then(self.recorded_at.cmp(&other.recorded_at))
            .then(self.uuid.cmp(&other.uuid))
    }
}
