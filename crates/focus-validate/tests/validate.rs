//! End-to-end validation of small datasets.

use focus_model::{
    AllowedValuesSettings, CellValue, Column, ColumnSpec, DataType, FeatureLevel, FocusSpec,
    MappingConfig, MappingRule, NullableSettings, PresenceSettings, Severity, Step, Table,
    ValidationMode, ValidationReport, ValidationSettings,
};
use focus_validate::{validate_focus_table, write_validation_report};

fn spec() -> FocusSpec {
    FocusSpec::new(
        "1.2",
        vec![
            ColumnSpec::new("BilledCost", FeatureLevel::Mandatory, DataType::Decimal, false),
            ColumnSpec::new("BillingCurrency", FeatureLevel::Mandatory, DataType::String, false),
            ColumnSpec::new("ChargeCategory", FeatureLevel::Mandatory, DataType::String, false)
                .with_allowed_values(["Usage", "Purchase", "Tax", "Credit", "Adjustment"]),
            ColumnSpec::new("ChargePeriodStart", FeatureLevel::Mandatory, DataType::DateTime, false),
            ColumnSpec::new(
                "CommitmentDiscountId",
                FeatureLevel::Conditional,
                DataType::String,
                true,
            ),
            ColumnSpec::new("Tags", FeatureLevel::Optional, DataType::Structured, true),
        ],
    )
}

fn dataset() -> Table {
    Table::new(vec![
        Column::from_text("BilledCost", [Some("$1,234.50"), Some("oops")]),
        Column::from_text("BillingCurrency", [Some("USD"), Some("usd")]),
        Column::from_text("ChargeCategory", [Some("Usage"), Some("usage")]),
        Column::from_text("Team", [Some("core"), Some("data")]),
        Column::from_text("x_Team", [Some("core"), Some("data")]),
    ])
    .expect("dataset")
}

fn findings_for<'a>(report: &'a ValidationReport, check_id: &str) -> Vec<&'a str> {
    report
        .findings
        .iter()
        .filter(|f| f.check_id == check_id)
        .filter_map(|f| f.column.as_deref())
        .collect()
}

fn mapping_with(target: &str, validation: ValidationSettings) -> MappingConfig {
    MappingConfig::new(
        "1.2",
        vec![MappingRule::new(target, vec![Step::Null]).with_validation(validation)],
    )
    .expect("mapping")
}

#[test]
fn report_snapshot() {
    let report = validate_focus_table(&dataset(), &spec(), None);
    insta::assert_json_snapshot!(report, @r#"
    {
      "spec_version": "1.2",
      "summary": {
        "errors": 4,
        "warnings": 2
      },
      "findings": [
        {
          "check_id": "focus.column_present",
          "severity": "ERROR",
          "message": "FOCUS column is missing from dataset",
          "column": "ChargePeriodStart",
          "failing_rows": null,
          "sample_values": null
        },
        {
          "check_id": "focus.column_present",
          "severity": "WARN",
          "message": "FOCUS column is missing from dataset",
          "column": "CommitmentDiscountId",
          "failing_rows": null,
          "sample_values": null
        },
        {
          "check_id": "focus.column_present",
          "severity": "INFO",
          "message": "FOCUS column is missing from dataset",
          "column": "Tags",
          "failing_rows": null,
          "sample_values": null
        },
        {
          "check_id": "focus.allowed_values",
          "severity": "ERROR",
          "message": "Column contains values outside allowed set",
          "column": "ChargeCategory",
          "failing_rows": 1,
          "sample_values": [
            "usage"
          ]
        },
        {
          "check_id": "focus.decimal_parse",
          "severity": "ERROR",
          "message": "Decimal column contains values that cannot be parsed as decimals",
          "column": "BilledCost",
          "failing_rows": 1,
          "sample_values": [
            "oops"
          ]
        },
        {
          "check_id": "focus.unknown_column",
          "severity": "WARN",
          "message": "Column is not in FOCUS schema and does not use x_ extension prefix",
          "column": "Team",
          "failing_rows": null,
          "sample_values": null
        },
        {
          "check_id": "focus.currency_format",
          "severity": "ERROR",
          "message": "BillingCurrency must be a 3-letter uppercase ISO 4217 code",
          "column": "BillingCurrency",
          "failing_rows": 1,
          "sample_values": [
            "usd"
          ]
        }
      ]
    }
    "#);
}

#[test]
fn missing_mandatory_column_is_a_single_error() {
    let table = Table::new(vec![Column::from_text("BilledCost", [Some("1")])]).expect("table");
    let spec = FocusSpec::new(
        "1.2",
        vec![
            ColumnSpec::new("BilledCost", FeatureLevel::Mandatory, DataType::Decimal, false),
            ColumnSpec::new("BillingCurrency", FeatureLevel::Mandatory, DataType::String, false),
        ],
    );
    let report = validate_focus_table(&table, &spec, None);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].check_id, "focus.column_present");
    assert_eq!(report.findings[0].severity, Severity::Error);
    assert_eq!(report.findings[0].column.as_deref(), Some("BillingCurrency"));
}

#[test]
fn presence_can_be_waived_per_column() {
    let waived = ValidationSettings {
        presence: Some(PresenceSettings {
            enforce: Some(false),
        }),
        ..ValidationSettings::default()
    };
    let mapping = mapping_with("ChargePeriodStart", waived);
    let report = validate_focus_table(&dataset(), &spec(), Some(&mapping));
    assert_eq!(
        findings_for(&report, "focus.column_present"),
        ["CommitmentDiscountId", "Tags"]
    );
}

#[test]
fn case_insensitive_override_accepts_lowercase_values() {
    let relaxed = ValidationSettings {
        allowed_values: Some(AllowedValuesSettings {
            case_insensitive: Some(true),
        }),
        ..ValidationSettings::default()
    };
    let mapping = mapping_with("ChargeCategory", relaxed);
    let report = validate_focus_table(&dataset(), &spec(), Some(&mapping));
    assert!(findings_for(&report, "focus.allowed_values").is_empty());
}

#[test]
fn strict_mode_disables_amount_normalization() {
    let table = Table::new(vec![Column::from_text("BilledCost", [Some("$1,234.50")])]).expect("table");
    let spec = FocusSpec::new(
        "1.2",
        vec![ColumnSpec::new("BilledCost", FeatureLevel::Mandatory, DataType::Decimal, false)],
    );
    assert!(validate_focus_table(&table, &spec, None).findings.is_empty());

    let strict = MappingConfig::new("1.2", vec![MappingRule::new("BilledCost", vec![Step::Null])])
        .expect("mapping")
        .with_validation_defaults(ValidationSettings {
            mode: Some(ValidationMode::Strict),
            ..ValidationSettings::default()
        });
    let report = validate_focus_table(&table, &spec, Some(&strict));
    assert_eq!(findings_for(&report, "focus.decimal_parse"), ["BilledCost"]);
}

#[test]
fn null_rules_follow_spec_unless_overridden() {
    let table = Table::new(vec![
        Column::new("BilledCost", vec![CellValue::Null, CellValue::Int(1)]),
        Column::new("CommitmentDiscountId", vec![CellValue::Null, CellValue::text("cd-1")]),
    ])
    .expect("table");
    let report = validate_focus_table(&table, &spec(), None);
    assert_eq!(findings_for(&report, "focus.not_null"), ["BilledCost"]);
    let not_null = report
        .findings
        .iter()
        .find(|f| f.check_id == "focus.not_null")
        .expect("not_null finding");
    assert_eq!(not_null.failing_rows, Some(1));
    assert_eq!(not_null.sample_values.as_deref(), Some(&[][..]));

    let forbid = ValidationSettings {
        nullable: Some(NullableSettings {
            allow_nulls: Some(false),
        }),
        ..ValidationSettings::default()
    };
    let allow = ValidationSettings {
        nullable: Some(NullableSettings {
            allow_nulls: Some(true),
        }),
        ..ValidationSettings::default()
    };
    let mapping = MappingConfig::new(
        "1.2",
        vec![
            MappingRule::new("BilledCost", vec![Step::Null]).with_validation(allow),
            MappingRule::new("CommitmentDiscountId", vec![Step::Null]).with_validation(forbid),
        ],
    )
    .expect("mapping");
    let report = validate_focus_table(&table, &spec(), Some(&mapping));
    assert_eq!(findings_for(&report, "focus.not_null"), ["CommitmentDiscountId"]);
}

#[test]
fn extension_prefix_silences_unknown_column_warning() {
    let report = validate_focus_table(&dataset(), &spec(), None);
    assert_eq!(findings_for(&report, "focus.unknown_column"), ["Team"]);
}

#[test]
fn validation_is_repeatable() {
    let first = validate_focus_table(&dataset(), &spec(), None);
    let second = validate_focus_table(&dataset(), &spec(), None);
    assert_eq!(first, second);
}

#[test]
fn report_is_written_as_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("report.json");
    let report = validate_focus_table(&dataset(), &spec(), None);
    write_validation_report(&report, &path).expect("write report");

    let text = std::fs::read_to_string(&path).expect("read report");
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["summary"]["errors"], 4);
    assert_eq!(value["findings"].as_array().map(Vec::len), Some(7));
}

#[test]
fn unwritable_path_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("report.json");
    let report = ValidationReport::new("1.2", vec![]);
    assert!(write_validation_report(&report, &path).is_err());
}
