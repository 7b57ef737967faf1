//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to the app and widget via FRB.
//! - Keep error semantics simple: every call returns an envelope.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Dates cross the boundary as `YYYY-MM-DD` strings; `None` means today
//!   in the device's local time zone.
//! - IDs cross the boundary as hyphenated UUID strings.

use chrono::{Local, NaiveDate};
use log::warn;
use pilltrack_core::db::open_db;
use pilltrack_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AddEntryOutcome, AddEntryRequest, CoreConfig, Medicine, MedicineService, RegistryEntry,
    RegistryService, RegistryServiceError, SqliteMedicineRepository, SqliteRegistryRepository,
    WidgetService,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

static CORE_CONFIG: OnceLock<CoreConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Medicine item shown in lists and pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineItem {
    pub medicine_id: String,
    pub name: String,
    pub interval_days: u32,
}

/// Response envelope for medicine calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineResponse {
    pub ok: bool,
    pub items: Vec<MedicineItem>,
    pub message: String,
}

/// Registry entry item in `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryItem {
    pub entry_id: String,
    pub date: String,
    pub taken: bool,
}

/// Response envelope for registry writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAddResponse {
    pub ok: bool,
    /// One of `inserted|replaced|conflict|rejected|error`.
    pub outcome: String,
    pub entry: Option<RegistryItem>,
    /// Authoritative entry already covering the period (conflicts only).
    pub existing: Option<RegistryItem>,
    /// Entries removed from the period by an overwrite, oldest first.
    pub replaced: Vec<RegistryItem>,
    pub message: String,
}

/// Response envelope for registry reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryQueryResponse {
    pub ok: bool,
    /// Period status label (`no_data_before|taken|not_taken`) for status calls.
    pub status: Option<String>,
    pub items: Vec<RegistryItem>,
    pub message: String,
}

/// Widget read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetResponse {
    pub ok: bool,
    pub medicine_name: String,
    pub status: String,
    pub last_taken: Option<String>,
    pub next_due: Option<String>,
    pub days_until_due: Option<i64>,
    pub message: String,
}

/// Registers a new medicine with its dosing interval.
#[flutter_rust_bridge::frb(sync)]
pub fn medicine_create(name: String, interval_days: u32) -> MedicineResponse {
    let result = with_connection(|conn| {
        let repo = SqliteMedicineRepository::try_new(conn).map_err(|err| err.to_string())?;
        MedicineService::new(repo)
            .create_medicine(name, interval_days)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(medicine) => MedicineResponse {
            ok: true,
            items: vec![to_medicine_item(medicine)],
            message: "Medicine created.".to_string(),
        },
        Err(err) => medicine_failure(format!("medicine_create failed: {err}")),
    }
}

/// Lists active medicines sorted by name.
#[flutter_rust_bridge::frb(sync)]
pub fn medicine_list() -> MedicineResponse {
    let result = with_connection(|conn| {
        let repo = SqliteMedicineRepository::try_new(conn).map_err(|err| err.to_string())?;
        MedicineService::new(repo)
            .list_medicines()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(medicines) => MedicineResponse {
            ok: true,
            message: format!("Found {} medicine(s).", medicines.len()),
            items: medicines.into_iter().map(to_medicine_item).collect(),
        },
        Err(err) => medicine_failure(format!("medicine_list failed: {err}")),
    }
}

/// Archives a medicine; its history is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn medicine_archive(medicine_id: String) -> MedicineResponse {
    let result = parse_id(&medicine_id).and_then(|id| {
        with_connection(|conn| {
            let repo = SqliteMedicineRepository::try_new(conn).map_err(|err| err.to_string())?;
            MedicineService::new(repo)
                .archive_medicine(id)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(()) => MedicineResponse {
            ok: true,
            items: Vec::new(),
            message: "Medicine archived.".to_string(),
        },
        Err(err) => medicine_failure(format!("medicine_archive failed: {err}")),
    }
}

/// Logs one dose for the period containing `date`.
///
/// # FFI contract
/// - `date = None` logs for today.
/// - Conflicts are reported with `outcome = "conflict"` and the existing entry.
#[flutter_rust_bridge::frb(sync)]
pub fn registry_add(
    medicine_id: String,
    date: Option<String>,
    taken: bool,
    overwrite: bool,
) -> RegistryAddResponse {
    let today = today();
    let request = match (parse_id(&medicine_id), parse_date(date.as_deref(), today)) {
        (Ok(medicine_id), Ok(date)) => AddEntryRequest {
            medicine_id,
            date,
            taken,
            overwrite,
        },
        (Err(err), _) | (_, Err(err)) => {
            return add_failure("rejected", format!("registry_add failed: {err}"), None)
        }
    };

    let result = with_connection(|conn| {
        let service = registry_service(conn)?;
        Ok(service.add_entry(&request, today))
    });
    to_add_response("registry_add", result)
}

/// Reconciles the period containing `date` (today when `None`).
#[flutter_rust_bridge::frb(sync)]
pub fn registry_status(medicine_id: String, date: Option<String>) -> RegistryQueryResponse {
    let today = today();
    let result = parse_id(&medicine_id).and_then(|id| {
        let date = parse_date(date.as_deref(), today)?;
        with_connection(|conn| {
            registry_service(conn)?
                .status_for(id, date)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(status) => RegistryQueryResponse {
            ok: true,
            status: Some(status.as_str().to_string()),
            items: Vec::new(),
            message: String::new(),
        },
        Err(err) => query_failure(format!("registry_status failed: {err}")),
    }
}

/// Lists entries between two dates (inclusive, ascending).
#[flutter_rust_bridge::frb(sync)]
pub fn registry_history(medicine_id: String, from: String, to: String) -> RegistryQueryResponse {
    let today = today();
    let result = parse_id(&medicine_id).and_then(|id| {
        let from = parse_date(Some(from.as_str()), today)?;
        let to = parse_date(Some(to.as_str()), today)?;
        with_connection(|conn| {
            registry_service(conn)?
                .entries_between(id, from, to)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(entries) => RegistryQueryResponse {
            ok: true,
            status: None,
            message: format!("Found {} entr(ies).", entries.len()),
            items: entries.iter().map(to_registry_item).collect(),
        },
        Err(err) => query_failure(format!("registry_history failed: {err}")),
    }
}

/// Builds the widget view for today.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_snapshot(medicine_id: String) -> WidgetResponse {
    let today = today();
    let result = parse_id(&medicine_id).and_then(|id| {
        with_connection(|conn| {
            WidgetService::new(registry_service(conn)?)
                .snapshot(id, today)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(snapshot) => WidgetResponse {
            ok: true,
            medicine_name: snapshot.medicine_name,
            status: snapshot.status.as_str().to_string(),
            last_taken: snapshot.last_taken.map(format_date),
            next_due: snapshot.next_due.map(format_date),
            days_until_due: snapshot.days_until_due,
            message: String::new(),
        },
        Err(err) => WidgetResponse {
            ok: false,
            medicine_name: String::new(),
            status: String::new(),
            last_taken: None,
            next_due: None,
            days_until_due: None,
            message: format!("widget_snapshot failed: {err}"),
        },
    }
}

/// Widget yes/no tap: logs today and replaces any entry in the period.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_log(medicine_id: String, taken: bool) -> RegistryAddResponse {
    let today = today();
    let id = match parse_id(&medicine_id) {
        Ok(id) => id,
        Err(err) => return add_failure("rejected", format!("widget_log failed: {err}"), None),
    };
    let result = with_connection(|conn| {
        let widget = WidgetService::new(registry_service(conn)?);
        Ok(widget.quick_log(id, taken, today))
    });
    to_add_response("widget_log", result)
}

fn to_add_response(
    operation: &str,
    result: Result<Result<AddEntryOutcome, RegistryServiceError>, String>,
) -> RegistryAddResponse {
    match result {
        Ok(Ok(AddEntryOutcome::Inserted(entry))) => RegistryAddResponse {
            ok: true,
            outcome: "inserted".to_string(),
            entry: Some(to_registry_item(&entry)),
            existing: None,
            replaced: Vec::new(),
            message: "Entry saved.".to_string(),
        },
        Ok(Ok(AddEntryOutcome::Replaced { entry, previous })) => RegistryAddResponse {
            ok: true,
            outcome: "replaced".to_string(),
            entry: Some(to_registry_item(&entry)),
            existing: None,
            replaced: previous.iter().map(to_registry_item).collect(),
            message: "Entry replaced.".to_string(),
        },
        Ok(Err(RegistryServiceError::Conflict { existing })) => add_failure(
            "conflict",
            format!(
                "{operation} failed: period already logged on {}",
                format_date(existing.date)
            ),
            Some(to_registry_item(&existing)),
        ),
        Ok(Err(err @ RegistryServiceError::FutureDate { .. })) => {
            add_failure("rejected", format!("{operation} failed: {err}"), None)
        }
        Ok(Err(err)) => add_failure("error", format!("{operation} failed: {err}"), None),
        Err(err) => add_failure("error", format!("{operation} failed: {err}"), None),
    }
}

fn add_failure(
    outcome: &str,
    message: String,
    existing: Option<RegistryItem>,
) -> RegistryAddResponse {
    RegistryAddResponse {
        ok: false,
        outcome: outcome.to_string(),
        entry: None,
        existing,
        replaced: Vec::new(),
        message,
    }
}

fn medicine_failure(message: String) -> MedicineResponse {
    MedicineResponse {
        ok: false,
        items: Vec::new(),
        message,
    }
}

fn query_failure(message: String) -> RegistryQueryResponse {
    RegistryQueryResponse {
        ok: false,
        status: None,
        items: Vec::new(),
        message,
    }
}

fn core_config() -> &'static CoreConfig {
    CORE_CONFIG.get_or_init(CoreConfig::from_env)
}

fn resolve_db_path() -> PathBuf {
    core_config().db_path.clone()
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| {
        warn!("event=ffi_call module=ffi status=error error_code=db_open_failed");
        format!("DB open failed: {err}")
    })?;
    f(&conn)
}

fn registry_service(
    conn: &Connection,
) -> Result<RegistryService<SqliteMedicineRepository<'_>, SqliteRegistryRepository<'_>>, String> {
    let medicines = SqliteMedicineRepository::try_new(conn).map_err(|err| err.to_string())?;
    let registry = SqliteRegistryRepository::try_new(conn).map_err(|err| err.to_string())?;
    Ok(RegistryService::new(medicines, registry))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid medicine id `{}`", raw.trim()))
}

fn parse_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, String> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(today),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| format!("invalid date `{value}`; expected YYYY-MM-DD")),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn to_medicine_item(medicine: Medicine) -> MedicineItem {
    MedicineItem {
        medicine_id: medicine.uuid.to_string(),
        name: medicine.name,
        interval_days: medicine.interval_days,
    }
}

fn to_registry_item(entry: &RegistryEntry) -> RegistryItem {
    RegistryItem {
        entry_id: entry.uuid.to_string(),
        date: format_date(entry.date),
        taken: entry.taken,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, medicine_create, parse_date, ping, registry_add,
        registry_history, registry_status, resolve_db_path, widget_log, widget_snapshot,
        CORE_CONFIG,
    };
    use chrono::NaiveDate;
    use pilltrack_core::CoreConfig;
    use std::sync::OnceLock;
    use tempfile::TempDir;

    static TEST_DB_DIR: OnceLock<TempDir> = OnceLock::new();

    /// Points every DB-backed call of this test binary at a private file.
    fn use_test_db() -> &'static TempDir {
        let dir = TEST_DB_DIR.get_or_init(|| tempfile::tempdir().unwrap());
        CORE_CONFIG.get_or_init(|| CoreConfig {
            db_path: dir.path().join("ffi-tests.sqlite3"),
            log_dir: None,
            log_level: "info".to_string(),
        });
        dir
    }

    fn create(name: &str, interval_days: u32) -> String {
        use_test_db();
        let response = medicine_create(name.to_string(), interval_days);
        assert!(response.ok, "{}", response.message);
        response.items[0].medicine_id.clone()
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir_and_unknown_level() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn tests_never_touch_the_default_database() {
        let dir = use_test_db();
        assert!(resolve_db_path().starts_with(dir.path()));
    }

    #[test]
    fn parse_date_defaults_to_today_and_rejects_other_formats() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_date(None, today), Ok(today));
        assert_eq!(parse_date(Some("  "), today), Ok(today));
        assert!(parse_date(Some("01/06/2024"), today).is_err());
    }

    #[test]
    fn registry_add_reports_conflict_then_overwrites() {
        let medicine_id = create("ffi-weekly", 7);

        let first = registry_add(medicine_id.clone(), Some("2024-01-01".into()), true, false);
        assert!(first.ok, "{}", first.message);
        assert_eq!(first.outcome, "inserted");

        let conflict = registry_add(medicine_id.clone(), Some("2024-01-03".into()), false, false);
        assert!(!conflict.ok);
        assert_eq!(conflict.outcome, "conflict");
        assert_eq!(conflict.existing.as_ref().map(|e| e.date.as_str()), Some("2024-01-01"));

        let replaced = registry_add(medicine_id.clone(), Some("2024-01-03".into()), false, true);
        assert_eq!(replaced.outcome, "replaced");
        assert!(replaced.existing.is_none());
        let removed: Vec<&str> = replaced.replaced.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(removed, vec!["2024-01-01"]);

        let status = registry_status(medicine_id.clone(), Some("2024-01-02".into()));
        assert_eq!(status.status.as_deref(), Some("not_taken"));

        let history = registry_history(medicine_id, "2024-01-31".into(), "2023-12-01".into());
        assert_eq!(history.items.len(), 1);
        assert_eq!(history.items[0].date, "2024-01-03");
    }

    #[test]
    fn registry_add_rejects_future_dates_and_bad_ids() {
        let medicine_id = create("ffi-future", 1);
        let future = registry_add(medicine_id, Some("9999-01-01".into()), true, false);
        assert_eq!(future.outcome, "rejected");

        let bad_id = registry_add("not-a-uuid".into(), None, true, false);
        assert!(!bad_id.ok);
        assert!(bad_id.message.contains("invalid medicine id"));
    }

    #[test]
    fn widget_log_then_snapshot_reports_taken() {
        let medicine_id = create("ffi-widget", 3);
        let logged = widget_log(medicine_id.clone(), true);
        assert!(logged.ok, "{}", logged.message);

        let snapshot = widget_snapshot(medicine_id);
        assert!(snapshot.ok, "{}", snapshot.message);
        assert_eq!(snapshot.status, "taken");
        assert_eq!(snapshot.days_until_due, Some(3));
    }
}
