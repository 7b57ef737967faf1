//! Domain model for medicines and their registry log.
//!
//! # Responsibility
//! - Define canonical data structures used by period reconciliation and storage.
//! - Validate records before they reach persistence.
//!
//! # Invariants
//! - Every medicine and registry entry is identified by a stable non-nil UUID.
//! - Medicine deletion is represented by soft-delete tombstones.
//! - Registry entry dates carry day granularity only.

pub mod medicine;
pub mod registry;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures for domain records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Stable IDs must never be the nil UUID.
    NilUuid,
    /// Medicine name is empty after trimming.
    EmptyName,
    /// Medicine name exceeds the allowed character count.
    NameTooLong { max_chars: usize, actual: usize },
    /// Dosing interval is outside the supported range.
    IntervalOutOfRange { interval_days: u32 },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "uuid must not be nil"),
            Self::EmptyName => write!(f, "medicine name must not be empty"),
            Self::NameTooLong { max_chars, actual } => write!(
                f,
                "medicine name must be at most {max_chars} chars, got {actual}"
            ),
            Self::IntervalOutOfRange { interval_days } => write!(
                f,
                "interval_days must be within {}..={}, got {interval_days}",
                medicine::MIN_INTERVAL_DAYS,
                medicine::MAX_INTERVAL_DAYS
            ),
        }
    }
}

impl Error for ModelValidationError {}
