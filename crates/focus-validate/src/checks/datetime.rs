//! Date/Time parseability and, in strict mode, ISO-8601 shape.

use std::sync::LazyLock;

use focus_model::{CellValue, Column, ValidationFinding, ValidationMode, ValidationSettings};
use focus_transform::{parse_datetime_utc, parse_datetime_with_format};
use regex::Regex;

use crate::util::collect_failures;

static ISO_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ][0-9:.+\-Z]+)?$").expect("valid ISO-8601 pattern")
});

fn parses(value: &CellValue, format: Option<&str>) -> bool {
    let CellValue::Text(text) = value else {
        return matches!(value, CellValue::DateTime(_));
    };
    match format {
        Some(format) => parse_datetime_with_format(text, format).is_some(),
        None => parse_datetime_utc(text).is_some(),
    }
}

fn looks_iso(value: &CellValue) -> bool {
    match value {
        CellValue::DateTime(_) => true,
        other => other
            .to_lossless_string()
            .is_some_and(|text| ISO_LIKE.is_match(&text)),
    }
}

pub fn check(column: &Column, settings: &ValidationSettings) -> Vec<ValidationFinding> {
    let format = settings.datetime_format();
    let mut findings = Vec::new();

    if settings.mode() == ValidationMode::Strict && format.is_none() {
        let failures = collect_failures(column.values(), |v| !v.is_null() && !looks_iso(v));
        findings.extend(failures.into_finding(
            "focus.datetime_format",
            "Date/Time column does not match ISO-8601 format",
            column.name(),
        ));
    }

    let failures = collect_failures(column.values(), |v| !v.is_null() && !parses(v, format));
    findings.extend(failures.into_finding(
        "focus.datetime_parse",
        "Date/Time column contains values that cannot be parsed",
        column.name(),
    ));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use focus_model::DateTimeSettings;

    fn column(values: &[Option<&str>]) -> Column {
        Column::from_text("ChargePeriodStart", values.iter().copied())
    }

    fn ids(findings: &[ValidationFinding]) -> Vec<&str> {
        findings.iter().map(|f| f.check_id.as_str()).collect()
    }

    #[test]
    fn permissive_mode_only_checks_parsing() {
        let col = column(&[Some("2024-01-01"), Some("01/15/2024"), Some("soon"), None]);
        let findings = check(&col, &ValidationSettings::engine_defaults());
        assert_eq!(ids(&findings), ["focus.datetime_parse"]);
        assert_eq!(findings[0].failing_rows, Some(1));
        assert_eq!(findings[0].sample_values.as_deref(), Some(&["soon".to_string()][..]));
    }

    #[test]
    fn strict_mode_requires_iso_shape() {
        let settings = ValidationSettings {
            mode: Some(ValidationMode::Strict),
            ..ValidationSettings::default()
        };
        let col = column(&[Some("2024-01-01T00:00:00Z"), Some("01/15/2024")]);
        let findings = check(&col, &settings);
        assert_eq!(ids(&findings), ["focus.datetime_format"]);
        assert_eq!(findings[0].sample_values.as_deref(), Some(&["01/15/2024".to_string()][..]));
    }

    #[test]
    fn explicit_format_replaces_iso_check() {
        let settings = ValidationSettings {
            mode: Some(ValidationMode::Strict),
            datetime: Some(DateTimeSettings {
                format: Some("%d.%m.%Y".into()),
            }),
            ..ValidationSettings::default()
        };
        let col = column(&[Some("15.01.2024"), Some("2024-01-15")]);
        let findings = check(&col, &settings);
        assert_eq!(ids(&findings), ["focus.datetime_parse"]);
        assert_eq!(findings[0].failing_rows, Some(1));
    }

    #[test]
    fn coerced_timestamps_pass() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let col = Column::new("ChargePeriodStart", vec![CellValue::DateTime(ts), CellValue::Null]);
        let strict = ValidationSettings {
            mode: Some(ValidationMode::Strict),
            ..ValidationSettings::default()
        };
        assert!(check(&col, &strict).is_empty());
    }
}
