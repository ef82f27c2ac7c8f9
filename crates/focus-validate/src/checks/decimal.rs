//! Decimal parseability, range and precision/scale limits.

use focus_model::{
    CellValue, Column, ColumnSpec, ValidationFinding, ValidationMode, ValidationSettings,
};
use focus_transform::{cell_to_decimal, decimal_precision, parse_decimal};
use rust_decimal::Decimal;

use crate::util::Failures;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£'];

/// Permissive normalization: trim, drop thousands separators, drop a leading
/// currency symbol.
fn normalize(text: &str) -> String {
    text.trim()
        .replace(',', "")
        .trim_start_matches(CURRENCY_SYMBOLS)
        .to_string()
}

fn to_decimal(value: &CellValue, mode: ValidationMode) -> Option<Decimal> {
    match value {
        CellValue::Text(text) if mode == ValidationMode::Permissive => {
            parse_decimal(&normalize(text))
        }
        CellValue::Bool(_) | CellValue::DateTime(_) | CellValue::Json(_) => None,
        other => cell_to_decimal(other),
    }
}

fn within_limits(value: &Decimal, precision: Option<u32>, scale: Option<u32>) -> bool {
    let actual_scale = value.scale();
    let actual_precision = decimal_precision(value);
    precision.is_none_or(|p| actual_precision <= p) && scale.is_none_or(|s| actual_scale <= s)
}

pub fn check(
    spec: &ColumnSpec,
    column: &Column,
    settings: &ValidationSettings,
) -> Vec<ValidationFinding> {
    let mode = settings.mode();
    let limits = settings.decimal.clone().unwrap_or_default();
    let name = column.name();

    let parsed: Vec<(&CellValue, Option<Decimal>)> = column
        .values()
        .iter()
        .map(|value| (value, to_decimal(value, mode)))
        .collect();

    // Runs `fails` over the values that parsed.
    let over_parsed = |fails: &dyn Fn(&Decimal) -> bool| -> Failures {
        let mut failures = Failures::default();
        for (value, decimal) in &parsed {
            if decimal.as_ref().is_some_and(fails) {
                failures.record(value);
            }
        }
        failures
    };

    let mut findings = Vec::new();
    let mut unparsable = Failures::default();
    for (value, decimal) in &parsed {
        if decimal.is_none() && !value.is_null() {
            unparsable.record(value);
        }
    }
    findings.extend(unparsable.into_finding(
        "focus.decimal_parse",
        "Decimal column contains values that cannot be parsed as decimals",
        name,
    ));

    if limits.integer_only == Some(true) {
        findings.extend(over_parsed(&|d| d.scale() > 0).into_finding(
            "focus.decimal_integer_only",
            "Decimal column contains non-integer values",
            name,
        ));
    }
    if let Some(min) = limits.min {
        findings.extend(over_parsed(&|d| *d < min).into_finding(
            "focus.decimal_min",
            "Decimal column contains values below minimum",
            name,
        ));
    }
    if let Some(max) = limits.max {
        findings.extend(over_parsed(&|d| *d > max).into_finding(
            "focus.decimal_max",
            "Decimal column contains values above maximum",
            name,
        ));
    }

    let precision = limits.precision.or(spec.numeric_precision);
    let scale = limits.scale.or(spec.numeric_scale);
    if precision.is_some() || scale.is_some() {
        findings.extend(
            over_parsed(&|d| !within_limits(d, precision, scale)).into_finding(
                "focus.decimal_precision_scale",
                "Decimal column exceeds defined precision/scale limits",
                name,
            ),
        );
    }
    findings
}
