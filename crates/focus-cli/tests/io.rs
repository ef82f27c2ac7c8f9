//! CSV reading and writing.

use std::fs;
use std::str::FromStr;

use chrono::{TimeZone, Utc};
use focus_cli::io::{read_csv_table, write_csv_table};
use focus_model::{CellValue, Column, Table};
use rust_decimal::Decimal;
use serde_json::json;

#[test]
fn every_column_is_read_as_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("billing.csv");
    fs::write(&path, "account,cost,note\n007,1.50,\n008,2,hello\n").expect("write csv");

    let table = read_csv_table(&path).expect("read csv");
    assert_eq!(table.column_names(), vec!["account", "cost", "note"]);
    assert_eq!(table.height(), 2);
    assert_eq!(table.column("account").unwrap().get(0), Some(&CellValue::text("007")));
    assert_eq!(table.column("cost").unwrap().get(0), Some(&CellValue::text("1.50")));
    assert_eq!(table.column("note").unwrap().get(0), Some(&CellValue::Null));
}

#[test]
fn missing_file_is_reported_with_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nope.csv");
    let err = read_csv_table(&path).unwrap_err();
    assert!(format!("{err:#}").contains("nope.csv"), "{err:#}");
}

#[test]
fn output_renders_exact_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("focus.csv");
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let table = Table::new(vec![
        Column::new(
            "BilledCost",
            vec![
                CellValue::Decimal(Decimal::from_str("1.50").unwrap()),
                CellValue::Null,
            ],
        ),
        Column::new("ChargePeriodStart", vec![CellValue::DateTime(at), CellValue::DateTime(at)]),
        Column::new("Tags", vec![CellValue::Json(json!({"team": "core"})), CellValue::Null]),
    ])
    .unwrap();

    write_csv_table(&table, &path).expect("write csv");
    let back = read_csv_table(&path).expect("read back");
    assert_eq!(
        back.column("BilledCost").unwrap().values(),
        &[CellValue::text("1.50"), CellValue::Null]
    );
    assert_eq!(
        back.column("ChargePeriodStart").unwrap().get(0),
        Some(&CellValue::text("2024-01-01T00:00:00Z"))
    );
    assert_eq!(
        back.column("Tags").unwrap().get(0),
        Some(&CellValue::text(r#"{"team":"core"}"#))
    );
}
