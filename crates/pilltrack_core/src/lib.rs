//! Core domain logic for PillTrack.
//! This crate is the single source of truth for dosing-period invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod period;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::medicine::{Medicine, MedicineId};
pub use model::registry::{RegistryEntry, RegistryEntryId};
pub use model::ModelValidationError;
pub use period::{PeriodStatus, PeriodWindow};
pub use repo::medicine_repo::{MedicineRepository, SqliteMedicineRepository};
pub use repo::registry_repo::{
    PeriodWrite, RegistryListQuery, RegistryRepository, SqliteRegistryRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::medicine_service::MedicineService;
pub use service::registry_service::{
    AddEntryOutcome, AddEntryRequest, RegistryService, RegistryServiceError, RegistryServiceResult,
};
pub use service::widget_service::{WidgetService, WidgetSnapshot};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
