use appt_insights::models::{RawRow, RawValue, Record};
use appt_insights::normalize::{RejectReason, normalize_row, normalize_rows};
use chrono::NaiveDate;

fn dated(value: impl Into<RawValue>) -> RawRow {
    RawRow::new()
        .with("Date", value)
        .with("Location", "North")
        .with("Source", "Web")
}

#[test]
fn every_date_shape_yields_the_same_iso_date() {
    let shapes: Vec<RawValue> = vec![
        RawValue::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
        RawValue::Number(45296.0),
        RawValue::Number(45296.4),
        RawValue::Text("2024-01-05".into()),
        RawValue::Text("01/05/2024".into()),
        RawValue::Text("January 5, 2024".into()),
        RawValue::Text("5 Jan 2024".into()),
        RawValue::Text("2024-01-05T14:30:00Z".into()),
        RawValue::Text("2024-01-05 09:15".into()),
        RawValue::Text("45296".into()),
    ];
    for shape in shapes {
        let rec = normalize_row(&dated(shape.clone())).unwrap_or_else(|e| panic!("{shape:?}: {e}"));
        assert_eq!(rec.date, "2024-01-05", "shape {shape:?}");
    }
}

#[test]
fn column_labels_match_aliases_loosely() {
    let row = RawRow::new()
        .with("Appointment Date", "2024-02-10")
        .with("Location Name", "  Clinic B ")
        .with("APPT_SOURCE", "Phone")
        .with("Service Name", "Cleaning");
    let rec = normalize_row(&row).unwrap();
    assert_eq!(
        rec,
        Record::new("2024-02-10", "Clinic B", "Phone").with_service("Cleaning")
    );

    let row = RawRow::new()
        .with("appt_date", "2024-02-11")
        .with("CITY", "Lyon")
        .with("source", "Walk-in");
    let rec = normalize_row(&row).unwrap();
    assert_eq!(rec.location, "Lyon");
    assert_eq!(rec.date, "2024-02-11");
}

#[test]
fn blank_primary_date_falls_through_to_next_alias() {
    let row = RawRow::new()
        .with("Date", "   ")
        .with("Appt Date", "2024-03-01");
    assert_eq!(normalize_row(&row).unwrap().date, "2024-03-01");
}

#[test]
fn defaults_apply_only_to_location_and_source() {
    let row = RawRow::new()
        .with("date", "2024-01-05")
        .with("location", "   ")
        .with("service", "");
    let rec = normalize_row(&row).unwrap();
    assert_eq!(rec.location, "Unknown");
    assert_eq!(rec.source, "Unknown");
    assert_eq!(rec.service, None);

    let rec = normalize_row(&RawRow::new().with("date", "2024-01-05")).unwrap();
    assert_eq!(rec.service, None);
}

#[test]
fn numeric_cells_become_plain_labels() {
    let row = RawRow::new()
        .with("date", "2024-01-05")
        .with("location", 101.0)
        .with("source", "Web");
    assert_eq!(normalize_row(&row).unwrap().location, "101");
}

#[test]
fn undatable_rows_are_rejected_with_a_reason() {
    assert_eq!(
        normalize_row(&RawRow::new().with("location", "A")),
        Err(RejectReason::MissingDate)
    );
    assert_eq!(
        normalize_row(&dated("sometime soon")),
        Err(RejectReason::UnparseableDate("sometime soon".into()))
    );
    assert!(matches!(
        normalize_row(&dated(0.0)),
        Err(RejectReason::SerialOutOfRange(_))
    ));
    assert_eq!(normalize_row(&dated(RawValue::Empty)), Err(RejectReason::MissingDate));
}

#[test]
fn a_bad_row_does_not_affect_its_neighbours() {
    let rows = vec![
        dated("2024-01-05"),
        dated("garbage"),
        dated(45300.0),
    ];
    let out = normalize_rows(&rows);
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].date, "2024-01-05");
    assert_eq!(out.records[1].date, "2024-01-09");
    assert_eq!(out.rejected.len(), 1);
    assert_eq!(out.rejected[0].row, 1);
}

#[test]
fn normalizing_a_canonical_record_is_idempotent() {
    let recs = vec![
        Record::new("2024-01-05", "North", "Web"),
        Record::new("2023-12-31", "Unknown", "Unknown").with_service("X-Ray"),
    ];
    for rec in recs {
        let again = normalize_row(&RawRow::from(&rec)).unwrap();
        assert_eq!(again, rec);
        let twice = normalize_row(&RawRow::from(&again)).unwrap();
        assert_eq!(twice, rec);
    }
}
