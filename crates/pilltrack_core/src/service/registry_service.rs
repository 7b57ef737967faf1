//! Registry use-case service: logging doses and reconciling periods.
//!
//! # Responsibility
//! - Add registry entries with future-date and period-conflict checks.
//! - Answer temporal queries for one medicine using its dosing interval.
//!
//! # Invariants
//! - Entries dated after `today` are never written.
//! - At most one write per period unless the caller asks to overwrite; an
//!   overwrite clears the whole period window and inserts the new entry in
//!   the same transaction that found the conflict.
//! - Reconciliation reads only the period window plus one older entry.

use crate::model::medicine::{Medicine, MedicineId};
use crate::model::registry::{RegistryEntry, RegistryEntryId};
use crate::period::{self, PeriodStatus, PeriodWindow};
use crate::repo::medicine_repo::MedicineRepository;
use crate::repo::registry_repo::{PeriodWrite, RegistryListQuery, RegistryRepository};
use crate::repo::RepoError;
use chrono::{Days, NaiveDate};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for registry use-cases.
#[derive(Debug)]
pub enum RegistryServiceError {
    /// Target medicine does not exist or is archived.
    MedicineNotFound(MedicineId),
    /// Entry date lies after the caller's current day.
    FutureDate { date: NaiveDate, today: NaiveDate },
    /// Another entry already covers the period and overwrite was not requested.
    Conflict { existing: RegistryEntry },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for RegistryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MedicineNotFound(id) => write!(f, "medicine not found: {id}"),
            Self::FutureDate { date, today } => {
                write!(f, "entry date {date} is after today ({today})")
            }
            Self::Conflict { existing } => write!(
                f,
                "period already has an entry dated {} (taken={})",
                existing.date, existing.taken
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RegistryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::MedicineNotFound(id) => Self::MedicineNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type RegistryServiceResult<T> = Result<T, RegistryServiceError>;

/// Request model for logging one dose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddEntryRequest {
    pub medicine_id: MedicineId,
    pub date: NaiveDate,
    pub taken: bool,
    /// Replace an entry already covering the same period.
    pub overwrite: bool,
}

/// Successful result of `RegistryService::add_entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddEntryOutcome {
    /// No entry covered the period; the new entry was stored.
    Inserted(RegistryEntry),
    /// Every entry in the period window was deleted and the new entry stored.
    Replaced {
        entry: RegistryEntry,
        /// Removed entries, oldest first.
        previous: Vec<RegistryEntry>,
    },
}

impl AddEntryOutcome {
    pub fn entry(&self) -> &RegistryEntry {
        match self {
            Self::Inserted(entry) | Self::Replaced { entry, .. } => entry,
        }
    }
}

/// Registry service facade over medicine and registry repositories.
pub struct RegistryService<M: MedicineRepository, R: RegistryRepository> {
    medicines: M,
    registry: R,
}

impl<M: MedicineRepository, R: RegistryRepository> RegistryService<M, R> {
    pub fn new(medicines: M, registry: R) -> Self {
        Self {
            medicines,
            registry,
        }
    }

    /// Loads an active medicine or reports it as missing.
    pub fn medicine(&self, medicine_id: MedicineId) -> RegistryServiceResult<Medicine> {
        self.medicines
            .get_medicine(medicine_id, false)?
            .ok_or(RegistryServiceError::MedicineNotFound(medicine_id))
    }

    /// Logs one dose for the period containing `request.date`.
    ///
    /// # Errors
    /// - `FutureDate` when `request.date > today`.
    /// - `Conflict` when the period is already covered and `overwrite` is off.
    /// - `MedicineNotFound` when the medicine is missing or archived.
    pub fn add_entry(
        &self,
        request: &AddEntryRequest,
        today: NaiveDate,
    ) -> RegistryServiceResult<AddEntryOutcome> {
        let medicine = self.medicine(request.medicine_id)?;

        if request.date > today {
            warn!("event=registry_add module=service status=rejected reason=future_date");
            return Err(RegistryServiceError::FutureDate {
                date: request.date,
                today,
            });
        }

        let entry = RegistryEntry::new(medicine.uuid, request.date, request.taken);
        match self
            .registry
            .record_in_period(&entry, medicine.interval_days, request.overwrite)?
        {
            PeriodWrite::Inserted => {
                info!(
                    "event=registry_add module=service status=ok outcome=inserted interval_days={}",
                    medicine.interval_days
                );
                Ok(AddEntryOutcome::Inserted(entry))
            }
            PeriodWrite::Conflict(existing) => {
                warn!("event=registry_add module=service status=rejected reason=conflict");
                Err(RegistryServiceError::Conflict { existing })
            }
            PeriodWrite::Replaced(previous) => {
                info!(
                    "event=registry_add module=service status=ok outcome=replaced interval_days={} removed={}",
                    medicine.interval_days,
                    previous.len()
                );
                Ok(AddEntryOutcome::Replaced { entry, previous })
            }
        }
    }

    /// Reconciles the period containing `date`.
    pub fn status_for(
        &self,
        medicine_id: MedicineId,
        date: NaiveDate,
    ) -> RegistryServiceResult<PeriodStatus> {
        let medicine = self.medicine(medicine_id)?;
        let window = PeriodWindow::around(date, medicine.interval_days);

        let mut entries = self.registry.list_entries(&RegistryListQuery::between(
            medicine.uuid,
            window.start,
            window.end,
        ))?;
        if entries.is_empty() {
            if let Some(before) = window.start.checked_sub_days(Days::new(1)) {
                entries = self.registry.list_entries(&RegistryListQuery {
                    to: Some(before),
                    newest_first: true,
                    limit: Some(1),
                    ..RegistryListQuery::all(medicine.uuid)
                })?;
            }
        }

        Ok(period::period_status(&entries, date, medicine.interval_days))
    }

    /// Returns the authoritative latest entry of the whole log.
    pub fn most_recent_entry(
        &self,
        medicine_id: MedicineId,
    ) -> RegistryServiceResult<Option<RegistryEntry>> {
        let medicine = self.medicine(medicine_id)?;
        let mut latest = self.registry.list_entries(&RegistryListQuery {
            newest_first: true,
            limit: Some(1),
            ..RegistryListQuery::all(medicine.uuid)
        })?;
        Ok(latest.pop())
    }

    /// Returns the date of the most recent dose marked as taken.
    pub fn last_taken_date(
        &self,
        medicine_id: MedicineId,
    ) -> RegistryServiceResult<Option<NaiveDate>> {
        let medicine = self.medicine(medicine_id)?;
        let taken = self.latest_taken(&medicine)?;
        Ok(period::last_taken_date(&taken))
    }

    /// Returns entries dated within `[from, to]` in ascending order.
    ///
    /// Reversed bounds are swapped.
    pub fn entries_between(
        &self,
        medicine_id: MedicineId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RegistryServiceResult<Vec<RegistryEntry>> {
        let medicine = self.medicine(medicine_id)?;
        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        let entries = self
            .registry
            .list_entries(&RegistryListQuery::between(medicine.uuid, low, high))?;
        Ok(entries)
    }

    /// Returns the day the next dose is due, `None` when never taken.
    pub fn next_due_date(
        &self,
        medicine_id: MedicineId,
    ) -> RegistryServiceResult<Option<NaiveDate>> {
        let medicine = self.medicine(medicine_id)?;
        let taken = self.latest_taken(&medicine)?;
        Ok(period::next_due_date(&taken, medicine.interval_days))
    }

    /// Deletes one entry by ID.
    pub fn delete_entry(&self, entry_id: RegistryEntryId) -> RegistryServiceResult<()> {
        self.registry.delete_entry(entry_id)?;
        info!("event=registry_delete module=service status=ok");
        Ok(())
    }

    fn latest_taken(&self, medicine: &Medicine) -> RegistryServiceResult<Vec<RegistryEntry>> {
        let entries = self.registry.list_entries(&RegistryListQuery {
            taken: Some(true),
            newest_first: true,
            limit: Some(1),
            ..RegistryListQuery::all(medicine.uuid)
        })?;
        Ok(entries)
    }
}
