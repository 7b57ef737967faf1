use chrono::NaiveDate;
use pilltrack_core::{Medicine, PeriodStatus, RegistryEntry};
use uuid::Uuid;

#[test]
fn medicine_serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let medicine = Medicine::with_id(id, "Lariam", 7).unwrap();

    let json = serde_json::to_value(&medicine).unwrap();
    assert_eq!(json["uuid"], id.to_string());
    assert_eq!(json["name"], "Lariam");
    assert_eq!(json["interval_days"], 7);
    assert_eq!(json["is_deleted"], false);

    let decoded: Medicine = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, medicine);
}

#[test]
fn registry_entry_serializes_date_without_time() {
    let entry = RegistryEntry {
        uuid: Uuid::from_u128(1),
        medicine_id: Uuid::from_u128(2),
        date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        taken: true,
        recorded_at: 1_709_200_000_000,
    };

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["date"], "2024-02-29");
    assert_eq!(json["taken"], true);
}

#[test]
fn period_status_uses_snake_case_labels() {
    assert_eq!(
        serde_json::to_value(PeriodStatus::NoDataBefore).unwrap(),
        "no_data_before"
    );
    assert_eq!(PeriodStatus::NotTaken.as_str(), "not_taken");
}
