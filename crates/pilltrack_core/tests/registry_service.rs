use chrono::NaiveDate;
use pilltrack_core::db::open_db_in_memory;
use pilltrack_core::{
    AddEntryOutcome, AddEntryRequest, MedicineService, PeriodStatus, RegistryListQuery,
    RegistryRepository, RegistryService, RegistryServiceError, SqliteMedicineRepository,
    SqliteRegistryRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn service(
    conn: &Connection,
) -> RegistryService<SqliteMedicineRepository<'_>, SqliteRegistryRepository<'_>> {
    RegistryService::new(
        SqliteMedicineRepository::try_new(conn).unwrap(),
        SqliteRegistryRepository::try_new(conn).unwrap(),
    )
}

fn weekly_medicine(conn: &Connection) -> Uuid {
    let medicines = MedicineService::new(SqliteMedicineRepository::try_new(conn).unwrap());
    medicines.create_medicine("Lariam", 7).unwrap().uuid
}

fn request(medicine_id: Uuid, date: &str, taken: bool, overwrite: bool) -> AddEntryRequest {
    AddEntryRequest {
        medicine_id,
        date: day(date),
        taken,
        overwrite,
    }
}

#[test]
fn add_entry_inserts_when_period_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);

    let outcome = service
        .add_entry(&request(medicine_id, "2024-03-01", true, false), day("2024-03-05"))
        .unwrap();
    assert!(matches!(outcome, AddEntryOutcome::Inserted(_)));
    assert_eq!(
        service.status_for(medicine_id, day("2024-03-05")).unwrap(),
        PeriodStatus::Taken
    );
}

#[test]
fn add_entry_rejects_future_dates_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);

    let err = service
        .add_entry(&request(medicine_id, "2024-03-06", true, false), day("2024-03-05"))
        .unwrap_err();
    assert!(matches!(err, RegistryServiceError::FutureDate { .. }));
    assert!(service.most_recent_entry(medicine_id).unwrap().is_none());
}

#[test]
fn add_entry_reports_conflict_and_keeps_existing_entry() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);
    let today = day("2024-03-10");

    let first = service
        .add_entry(&request(medicine_id, "2024-03-04", true, false), today)
        .unwrap();
    let err = service
        .add_entry(&request(medicine_id, "2024-03-09", false, false), today)
        .unwrap_err();

    match err {
        RegistryServiceError::Conflict { existing } => assert_eq!(&existing, first.entry()),
        other => panic!("unexpected error: {other}"),
    }
    let all = service
        .entries_between(medicine_id, day("2024-01-01"), today)
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn add_entry_with_overwrite_replaces_conflicting_entry() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);
    let today = day("2024-03-10");

    let first = service
        .add_entry(&request(medicine_id, "2024-03-04", true, false), today)
        .unwrap();
    let outcome = service
        .add_entry(&request(medicine_id, "2024-03-09", false, true), today)
        .unwrap();

    match &outcome {
        AddEntryOutcome::Replaced { previous, entry } => {
            assert_eq!(previous.as_slice(), std::slice::from_ref(first.entry()));
            assert_eq!(entry.date, day("2024-03-09"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let registry = SqliteRegistryRepository::try_new(&conn).unwrap();
    let stored = registry
        .list_entries(&RegistryListQuery::all(medicine_id))
        .unwrap();
    assert_eq!(stored, vec![outcome.entry().clone()]);
    assert_eq!(
        service.status_for(medicine_id, day("2024-03-09")).unwrap(),
        PeriodStatus::NotTaken
    );
}

#[test]
fn entries_outside_the_window_do_not_conflict() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);
    let today = day("2024-03-31");

    service
        .add_entry(&request(medicine_id, "2024-03-01", true, false), today)
        .unwrap();
    let outcome = service
        .add_entry(&request(medicine_id, "2024-03-08", true, false), today)
        .unwrap();
    assert!(matches!(outcome, AddEntryOutcome::Inserted(_)));
}

#[test]
fn status_distinguishes_no_data_from_missed_period() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);

    assert_eq!(
        service.status_for(medicine_id, day("2024-03-01")).unwrap(),
        PeriodStatus::NoDataBefore
    );

    service
        .add_entry(&request(medicine_id, "2024-03-01", true, false), day("2024-03-01"))
        .unwrap();
    assert_eq!(
        service.status_for(medicine_id, day("2024-02-01")).unwrap(),
        PeriodStatus::NoDataBefore
    );
    assert_eq!(
        service.status_for(medicine_id, day("2024-03-20")).unwrap(),
        PeriodStatus::NotTaken
    );
}

#[test]
fn temporal_queries_follow_the_log() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);
    let today = day("2024-04-30");

    for (date, taken) in [
        ("2024-04-01", true),
        ("2024-04-08", true),
        ("2024-04-15", false),
    ] {
        service
            .add_entry(&request(medicine_id, date, taken, false), today)
            .unwrap();
    }

    assert_eq!(
        service.most_recent_entry(medicine_id).unwrap().unwrap().date,
        day("2024-04-15")
    );
    assert_eq!(
        service.last_taken_date(medicine_id).unwrap(),
        Some(day("2024-04-08"))
    );
    assert_eq!(
        service.next_due_date(medicine_id).unwrap(),
        Some(day("2024-04-15"))
    );

    let dates: Vec<NaiveDate> = service
        .entries_between(medicine_id, day("2024-04-15"), day("2024-04-02"))
        .unwrap()
        .into_iter()
        .map(|entry| entry.date)
        .collect();
    assert_eq!(dates, vec![day("2024-04-08"), day("2024-04-15")]);
}

#[test]
fn archived_or_unknown_medicine_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let medicines = MedicineService::new(SqliteMedicineRepository::try_new(&conn).unwrap());
    medicines.archive_medicine(medicine_id).unwrap();
    let service = service(&conn);

    let err = service
        .add_entry(&request(medicine_id, "2024-03-01", true, false), day("2024-03-01"))
        .unwrap_err();
    assert!(matches!(err, RegistryServiceError::MedicineNotFound(id) if id == medicine_id));

    let unknown = Uuid::new_v4();
    assert!(matches!(
        service.status_for(unknown, day("2024-03-01")).unwrap_err(),
        RegistryServiceError::MedicineNotFound(_)
    ));
}

#[test]
fn delete_entry_removes_it_and_reports_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);

    let outcome = service
        .add_entry(&request(medicine_id, "2024-03-01", true, false), day("2024-03-01"))
        .unwrap();
    service.delete_entry(outcome.entry().uuid).unwrap();
    assert!(service.most_recent_entry(medicine_id).unwrap().is_none());

    let err = service.delete_entry(outcome.entry().uuid).unwrap_err();
    assert!(matches!(err, RegistryServiceError::Repo(_)));
}

#[test]
fn overwrite_after_interval_grows_clears_every_entry_in_the_window() {
    let conn = open_db_in_memory().unwrap();
    let medicines = MedicineService::new(SqliteMedicineRepository::try_new(&conn).unwrap());
    let medicine_id = medicines.create_medicine("Lariam", 1).unwrap().uuid;
    let service = service(&conn);
    let today = day("2024-03-10");

    let earlier = service
        .add_entry(&request(medicine_id, "2024-03-08", true, false), today)
        .unwrap();
    let later = service
        .add_entry(&request(medicine_id, "2024-03-09", true, false), today)
        .unwrap();
    medicines.set_interval(medicine_id, 7).unwrap();

    let outcome = service
        .add_entry(&request(medicine_id, "2024-03-05", false, true), today)
        .unwrap();
    match &outcome {
        AddEntryOutcome::Replaced { previous, .. } => {
            assert_eq!(
                previous,
                &vec![earlier.entry().clone(), later.entry().clone()]
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(
        service.status_for(medicine_id, day("2024-03-05")).unwrap(),
        PeriodStatus::NotTaken
    );
    let registry = SqliteRegistryRepository::try_new(&conn).unwrap();
    let stored = registry
        .list_entries(&RegistryListQuery::all(medicine_id))
        .unwrap();
    assert_eq!(stored, vec![outcome.entry().clone()]);
}

#[test]
fn rejected_conflict_leaves_the_log_untouched() {
    let conn = open_db_in_memory().unwrap();
    let medicine_id = weekly_medicine(&conn);
    let service = service(&conn);
    let today = day("2024-03-10");

    let first = service
        .add_entry(&request(medicine_id, "2024-03-04", true, false), today)
        .unwrap();
    let err = service
        .add_entry(&request(medicine_id, "2024-03-06", false, false), today)
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryServiceError::Conflict { ref existing } if existing == first.entry()
    ));

    let registry = SqliteRegistryRepository::try_new(&conn).unwrap();
    let stored = registry
        .list_entries(&RegistryListQuery::all(medicine_id))
        .unwrap();
    assert_eq!(stored, vec![first.entry().clone()]);
}
