//! Steps and validation settings as they appear in YAML mapping files.

use std::str::FromStr;

use focus_model::{
    ArithmeticOperator, CastTarget, CellValue, Merge, Operand, Step, ValidationMode,
    ValidationSettings,
};
use rust_decimal::Decimal;
use serde_json::json;

#[test]
fn step_list_reads_from_yaml() {
    let yaml = r#"
- op: from_column
  column: cost
- op: math
  operator: mul
  operands:
    - current: true
    - const: 1.1
- op: cast
  to: decimal
  scale: 2
- op: when
  column: type
  value: Tax
  then: 0
  else: null
"#;
    let steps: Vec<Step> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(
        steps[1],
        Step::Arithmetic {
            operator: ArithmeticOperator::Mul,
            operands: vec![Operand::Current, Operand::Constant(json!(1.1))],
        }
    );
    assert_eq!(
        steps[2],
        Step::Cast {
            to: CastTarget::Decimal,
            scale: Some(2),
            precision: None,
        }
    );
    let Step::Conditional { otherwise, .. } = &steps[3] else {
        panic!("expected conditional, got {:?}", steps[3]);
    };
    assert_eq!(otherwise, &json!(null));
}

#[test]
fn constant_amounts_from_yaml_are_exact_decimals() {
    let steps: Vec<Step> = serde_yaml::from_str(
        r#"
- op: const
  value: 1.10
- op: const
  value: "1.10"
- op: const
  value: 0.07
"#,
    )
    .unwrap();
    let cells: Vec<CellValue> = steps
        .iter()
        .map(|step| match step {
            Step::Constant { value } => CellValue::from_json(value),
            other => panic!("expected constant, got {other:?}"),
        })
        .collect();
    assert_eq!(cells[0], CellValue::Decimal(Decimal::from_str("1.1").unwrap()));
    assert_eq!(cells[1], CellValue::text("1.10"));
    assert_eq!(cells[2].to_lossless_string().as_deref(), Some("0.07"));
}

#[test]
fn unknown_op_in_yaml_is_an_error() {
    let err = serde_yaml::from_str::<Vec<Step>>("- op: pivot\n").unwrap_err();
    assert!(err.to_string().contains("pivot"), "{err}");
}

#[test]
fn bad_operand_in_yaml_is_an_error() {
    let yaml = "op: math\noperator: add\noperands:\n  - current: false\n";
    let err = serde_yaml::from_str::<Step>(yaml).unwrap_err();
    assert!(err.to_string().contains("operand must include"), "{err}");
}

#[test]
fn validation_settings_merge_from_yaml_layers() {
    let defaults: ValidationSettings = serde_yaml::from_str(
        r#"
mode: permissive
decimal:
  min: 0
string:
  trim: true
"#,
    )
    .unwrap();
    let column: ValidationSettings = serde_yaml::from_str(
        r#"
mode: strict
decimal:
  scale: 2
json:
  object_only: true
"#,
    )
    .unwrap();

    let merged = defaults.merge(&column);
    assert_eq!(merged.mode(), ValidationMode::Strict);
    assert!(merged.object_only());
    let decimal = merged.decimal.unwrap();
    assert_eq!(decimal.min, Some(Decimal::ZERO));
    assert_eq!(decimal.scale, Some(2));
    assert_eq!(merged.string.and_then(|s| s.trim), Some(true));
}
