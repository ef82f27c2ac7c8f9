//! Generate, validate and lint workflows against files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use focus_cli::io::read_csv_table;
use focus_cli::pipeline::{
    GenerateOptions, ValidateOptions, default_report_path, run_check_mapping, run_generate,
    run_validate,
};
use focus_model::CellValue;

const SPEC: &str = r#"{
  "version": "1.2",
  "columns": [
    {"name": "BilledCost", "feature_level": "Mandatory", "allows_nulls": false,
     "data_type": "Decimal", "numeric_precision": 12, "numeric_scale": 2},
    {"name": "BillingCurrency", "feature_level": "Mandatory", "allows_nulls": false,
     "data_type": "String"},
    {"name": "ChargePeriodStart", "feature_level": "Mandatory", "allows_nulls": false,
     "data_type": "Date/Time"},
    {"name": "Tags", "feature_level": "Conditional", "allows_nulls": true, "data_type": "JSON"}
  ]
}"#;

const MAPPING: &str = r#"
spec_version: v1.2
mappings:
  BilledCost:
    steps:
      - op: from_column
        column: cost
      - op: cast
        to: decimal
        scale: 2
  BillingCurrency:
    steps:
      - op: const
        value: USD
  ChargePeriodStart:
    steps:
      - op: from_column
        column: usage_start
  Tags:
    validation:
      json:
        object_only: true
    steps:
      - op: from_column
        column: tags
  x_Service:
    steps:
      - op: expr
        expr: df["service"].str.upper()
"#;

const SOURCE: &str = "\
cost,usage_start,service,tags
1.499,2024-01-01 00:00:00,ec2,\"{\"\"team\"\":\"\"core\"\"}\"
2,2024-01-02 00:00:00,s3,
";

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join("specs")).expect("spec dir");
        fs::write(root.join("specs/focus_spec_v1.2.json"), SPEC).expect("write spec");
        fs::write(root.join("mapping.yaml"), MAPPING).expect("write mapping");
        fs::write(root.join("billing.csv"), SOURCE).expect("write source");
        Self { _dir: dir, root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn spec_dir(&self) -> Option<PathBuf> {
        Some(self.path("specs"))
    }

    fn generate(&self) -> GenerateOptions {
        GenerateOptions {
            input: self.path("billing.csv"),
            mapping: self.path("mapping.yaml"),
            output: self.path("out/focus.csv"),
            spec_dir: self.spec_dir(),
            ..GenerateOptions::default()
        }
    }
}

fn report_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read report")).expect("report json")
}

#[test]
fn generate_writes_output_and_clean_report() {
    let fixture = Fixture::new();
    let outcome = run_generate(&fixture.generate()).expect("generate");

    assert_eq!(outcome.rows, 2);
    assert_eq!(outcome.columns, 5);
    assert!(!outcome.has_errors(), "{:?}", outcome.report);

    let output = read_csv_table(&outcome.output).expect("read output");
    assert_eq!(
        output.column_names(),
        vec!["BilledCost", "BillingCurrency", "ChargePeriodStart", "Tags", "x_Service"]
    );
    assert_eq!(
        output.column("BilledCost").unwrap().values(),
        &[CellValue::text("1.50"), CellValue::text("2.00")]
    );
    assert_eq!(
        output.column("ChargePeriodStart").unwrap().get(1),
        Some(&CellValue::text("2024-01-02T00:00:00Z"))
    );
    assert_eq!(
        output.column("x_Service").unwrap().get(0),
        Some(&CellValue::text("EC2"))
    );

    let report_path = default_report_path(&outcome.output);
    assert_eq!(outcome.report_path.as_deref(), Some(report_path.as_path()));
    let report = report_json(&report_path);
    assert_eq!(report["summary"]["errors"], 0);
    assert_eq!(report["spec_version"], "1.2");
}

#[test]
fn generate_can_skip_validation() {
    let fixture = Fixture::new();
    let options = GenerateOptions {
        skip_validation: true,
        ..fixture.generate()
    };
    let outcome = run_generate(&options).expect("generate");
    assert!(outcome.report.is_none());
    assert!(!default_report_path(&outcome.output).exists());
}

#[test]
fn generate_fails_on_bad_expression() {
    let fixture = Fixture::new();
    let broken = MAPPING.replace(r#"df["service"].str.upper()"#, "__import__('os')");
    fs::write(fixture.path("mapping.yaml"), broken).expect("write mapping");
    let err = run_generate(&fixture.generate()).unwrap_err();
    let text = format!("{err:#}");
    assert!(text.contains("x_Service"), "{text}");
    assert!(!fixture.path("out/focus.csv").exists());
}

#[test]
fn validate_reports_errors_in_raw_dataset() {
    let fixture = Fixture::new();
    fs::write(
        fixture.path("focus.csv"),
        "BilledCost,BillingCurrency,ChargePeriodStart,Team\n\"$1,200.00\",usd,yesterday,core\n",
    )
    .expect("write dataset");
    let out = fixture.path("report.json");
    let report = run_validate(&ValidateOptions {
        input: fixture.path("focus.csv"),
        spec_version: "v1.2".into(),
        spec_dir: fixture.spec_dir(),
        mapping: None,
        out: Some(out.clone()),
    })
    .expect("validate");

    let ids: Vec<&str> = report.findings.iter().map(|f| f.check_id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "focus.column_present",
            "focus.datetime_parse",
            "focus.unknown_column",
            "focus.currency_format",
        ]
    );
    assert_eq!(report.error_count(), 2);
    assert_eq!(report.warning_count(), 2);
    assert_eq!(report_json(&out)["summary"]["errors"], 2);
}

#[test]
fn validate_applies_mapping_overrides() {
    let fixture = Fixture::new();
    fs::write(
        fixture.path("focus.csv"),
        "BilledCost,BillingCurrency,ChargePeriodStart,Tags\n1,USD,2024-01-01,[1]\n",
    )
    .expect("write dataset");
    let options = ValidateOptions {
        input: fixture.path("focus.csv"),
        spec_version: "1.2".into(),
        spec_dir: fixture.spec_dir(),
        ..ValidateOptions::default()
    };
    assert!(!run_validate(&options).expect("validate").has_errors());

    let with_mapping = ValidateOptions {
        mapping: Some(fixture.path("mapping.yaml")),
        ..options
    };
    let report = run_validate(&with_mapping).expect("validate");
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].check_id, "focus.json_object");
}

#[test]
fn check_mapping_reports_lint_errors() {
    let fixture = Fixture::new();
    let lint = run_check_mapping(&fixture.path("mapping.yaml"), None, fixture.spec_dir().as_deref())
        .expect("lint");
    assert!(lint.is_valid(), "{:?}", lint.errors);

    let broken = MAPPING
        .replace(r#"df["service"].str.upper()"#, "df.__class__")
        .replace("  BillingCurrency:", "  Currency:");
    fs::write(fixture.path("mapping.yaml"), broken).expect("write mapping");
    let lint = run_check_mapping(&fixture.path("mapping.yaml"), None, fixture.spec_dir().as_deref())
        .expect("lint");
    assert_eq!(lint.errors.len(), 2, "{:?}", lint.errors);
    assert!(lint.errors.iter().any(|e| e.contains("Currency")));
    assert!(lint.errors.iter().any(|e| e.contains("x_Service")));
}
