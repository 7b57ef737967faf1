//! Medicine use-case service.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Archived medicines keep their registry history.

use crate::model::medicine::{Medicine, MedicineId};
use crate::repo::medicine_repo::MedicineRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;

/// Use-case service wrapper for medicine management.
pub struct MedicineService<M: MedicineRepository> {
    repo: M,
}

impl<M: MedicineRepository> MedicineService<M> {
    pub fn new(repo: M) -> Self {
        Self { repo }
    }

    /// Registers a new tracked medicine.
    pub fn create_medicine(
        &self,
        name: impl Into<String>,
        interval_days: u32,
    ) -> RepoResult<Medicine> {
        let medicine = Medicine::new(name, interval_days)?;
        self.repo.create_medicine(&medicine)?;
        info!(
            "event=medicine_create module=service status=ok interval_days={}",
            medicine.interval_days
        );
        Ok(medicine)
    }

    /// Changes the dosing interval of an active medicine.
    ///
    /// Existing entries are kept; later reconciliation uses the new interval.
    pub fn set_interval(&self, id: MedicineId, interval_days: u32) -> RepoResult<Medicine> {
        let mut medicine = self.require_active(id)?;
        medicine.interval_days = interval_days;
        self.repo.update_medicine(&medicine)?;
        Ok(medicine)
    }

    pub fn rename(&self, id: MedicineId, name: impl Into<String>) -> RepoResult<Medicine> {
        let mut medicine = self.require_active(id)?;
        medicine.name = name.into().trim().to_string();
        self.repo.update_medicine(&medicine)?;
        Ok(medicine)
    }

    pub fn get_medicine(&self, id: MedicineId) -> RepoResult<Option<Medicine>> {
        self.repo.get_medicine(id, false)
    }

    pub fn list_medicines(&self) -> RepoResult<Vec<Medicine>> {
        self.repo.list_medicines(false)
    }

    /// Soft-deletes a medicine; it disappears from lists and rejects new entries.
    pub fn archive_medicine(&self, id: MedicineId) -> RepoResult<()> {
        self.repo.soft_delete_medicine(id)?;
        info!("event=medicine_archive module=service status=ok");
        Ok(())
    }

    fn require_active(&self, id: MedicineId) -> RepoResult<Medicine> {
        self.repo
            .get_medicine(id, false)?
            .ok_or(RepoError::MedicineNotFound(id))
    }
}
