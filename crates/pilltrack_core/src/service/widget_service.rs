//! Home-screen widget projections.
//!
//! # Responsibility
//! - Build the compact "did I take it this period?" view for one medicine.
//! - Log a yes/no answer for today from a single widget tap.
//!
//! # Invariants
//! - Quick logging always targets `today` and always overwrites the period.

use crate::model::medicine::MedicineId;
use crate::period::PeriodStatus;
use crate::repo::medicine_repo::MedicineRepository;
use crate::repo::registry_repo::RegistryRepository;
use crate::service::registry_service::{
    AddEntryOutcome, AddEntryRequest, RegistryService, RegistryServiceResult,
};
use chrono::NaiveDate;
use serde::Serialize;

/// Read model rendered by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetSnapshot {
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub interval_days: u32,
    pub today: NaiveDate,
    pub status: PeriodStatus,
    pub last_taken: Option<NaiveDate>,
    pub next_due: Option<NaiveDate>,
    /// Days from `today` to `next_due`; negative when overdue.
    pub days_until_due: Option<i64>,
}

pub struct WidgetService<M: MedicineRepository, R: RegistryRepository> {
    registry: RegistryService<M, R>,
}

impl<M: MedicineRepository, R: RegistryRepository> WidgetService<M, R> {
    pub fn new(registry: RegistryService<M, R>) -> Self {
        Self { registry }
    }

    pub fn snapshot(
        &self,
        medicine_id: MedicineId,
        today: NaiveDate,
    ) -> RegistryServiceResult<WidgetSnapshot> {
        let medicine = self.registry.medicine(medicine_id)?;
        let status = self.registry.status_for(medicine_id, today)?;
        let last_taken = self.registry.last_taken_date(medicine_id)?;
        let next_due = self.registry.next_due_date(medicine_id)?;

        Ok(WidgetSnapshot {
            medicine_id,
            medicine_name: medicine.name,
            interval_days: medicine.interval_days,
            today,
            status,
            last_taken,
            next_due,
            days_until_due: next_due.map(|due| (due - today).num_days()),
        })
    }

    /// Records the widget's yes/no answer for today.
    pub fn quick_log(
        &self,
        medicine_id: MedicineId,
        taken: bool,
        today: NaiveDate,
    ) -> RegistryServiceResult<AddEntryOutcome> {
        let request = AddEntryRequest {
            medicine_id,
            date: today,
            taken,
            overwrite: true,
        };
        self.registry.add_entry(&request, today)
    }
}
