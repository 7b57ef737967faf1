//! Medicine domain model.
//!
//! # Responsibility
//! - Describe one tracked drug and its fixed dosing interval.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another medicine.
//! - `interval_days` is within `MIN_INTERVAL_DAYS..=MAX_INTERVAL_DAYS`.
//! - `name` is trimmed and non-empty.

use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a tracked medicine.
pub type MedicineId = Uuid;

/// Shortest supported dosing interval (daily pill).
pub const MIN_INTERVAL_DAYS: u32 = 1;
/// Longest supported dosing interval.
pub const MAX_INTERVAL_DAYS: u32 = 365;
/// Maximum medicine display name length in chars.
pub const MAX_NAME_CHARS: usize = 120;

/// One tracked drug with a fixed dosing interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    /// Stable ID referenced by registry entries.
    pub uuid: MedicineId,
    /// Display name shown in the app and widget.
    pub name: String,
    /// Number of days between expected doses.
    pub interval_days: u32,
    /// Soft delete tombstone; entries are kept for history.
    pub is_deleted: bool,
}

impl Medicine {
    /// Creates a validated medicine with a generated stable ID.
    ///
    /// # Errors
    /// - Returns `ModelValidationError` when name or interval are invalid.
    pub fn new(name: impl Into<String>, interval_days: u32) -> Result<Self, ModelValidationError> {
        Self::with_id(Uuid::new_v4(), name, interval_days)
    }

    /// Creates a validated medicine with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        uuid: MedicineId,
        name: impl Into<String>,
        interval_days: u32,
    ) -> Result<Self, ModelValidationError> {
        let medicine = Self {
            uuid,
            name: name.into().trim().to_string(),
            interval_days,
            is_deleted: false,
        };
        medicine.validate()?;
        Ok(medicine)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.uuid.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }

        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            return Err(ModelValidationError::EmptyName);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_NAME_CHARS {
            return Err(ModelValidationError::NameTooLong {
                max_chars: MAX_NAME_CHARS,
                actual: chars,
            });
        }

        if !(MIN_INTERVAL_DAYS..=MAX_INTERVAL_DAYS).contains(&self.interval_days) {
            return Err(ModelValidationError::IntervalOutOfRange {
                interval_days: self.interval_days,
            });
        }

        Ok(())
    }

    /// Marks this medicine as softly deleted.
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    /// Returns whether this medicine is still tracked.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
