//! String emptiness and length bounds.

use focus_model::{CellValue, Column, ValidationFinding, ValidationSettings};

use crate::util::collect_failures;

pub fn check(column: &Column, settings: &ValidationSettings) -> Vec<ValidationFinding> {
    let Some(limits) = settings.string.as_ref().filter(|s| !s.is_unset()) else {
        return Vec::new();
    };
    let trim = limits.trim.unwrap_or(true);
    let text_of = |value: &CellValue| {
        value.to_lossless_string().map(|text| {
            if trim {
                text.trim().to_string()
            } else {
                text
            }
        })
    };
    let length_of = |value: &CellValue| text_of(value).map(|t| t.chars().count());
    let name = column.name();
    let mut findings = Vec::new();

    if limits.allow_empty == Some(false) {
        let failures = collect_failures(column.values(), |v| length_of(v) == Some(0));
        findings.extend(failures.into_finding(
            "focus.string_empty",
            "String column contains empty values",
            name,
        ));
    }
    if let Some(min) = limits.min_length {
        let failures = collect_failures(column.values(), |v| length_of(v).is_some_and(|n| n < min));
        findings.extend(failures.into_finding(
            "focus.string_min_length",
            "String column contains values shorter than minimum length",
            name,
        ));
    }
    if let Some(max) = limits.max_length {
        let failures = collect_failures(column.values(), |v| length_of(v).is_some_and(|n| n > max));
        findings.extend(failures.into_finding(
            "focus.string_max_length",
            "String column contains values longer than maximum length",
            name,
        ));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_model::StringSettings;

    fn settings(limits: StringSettings) -> ValidationSettings {
        ValidationSettings {
            string: Some(limits),
            ..ValidationSettings::engine_defaults()
        }
    }

    fn ids(findings: &[ValidationFinding]) -> Vec<&str> {
        findings.iter().map(|f| f.check_id.as_str()).collect()
    }

    #[test]
    fn unset_settings_skip_the_check() {
        let col = Column::from_text("ServiceName", [Some("")]);
        assert!(check(&col, &ValidationSettings::engine_defaults()).is_empty());
        assert!(check(&col, &settings(StringSettings::default())).is_empty());
    }

    #[test]
    fn whitespace_counts_as_empty_when_trimming() {
        let col = Column::from_text("ServiceName", [Some("  "), Some("EC2"), None]);
        let limits = StringSettings {
            allow_empty: Some(false),
            ..StringSettings::default()
        };
        let findings = check(&col, &settings(limits.clone()));
        assert_eq!(ids(&findings), ["focus.string_empty"]);
        assert_eq!(findings[0].failing_rows, Some(1));

        let untrimmed = StringSettings {
            trim: Some(false),
            ..limits
        };
        assert!(check(&col, &settings(untrimmed)).is_empty());
    }

    #[test]
    fn length_bounds_count_characters() {
        let col = Column::from_text("ServiceName", [Some("ab"), Some("ééé"), Some("abcdef")]);
        let limits = StringSettings {
            min_length: Some(3),
            max_length: Some(5),
            ..StringSettings::default()
        };
        let findings = check(&col, &settings(limits));
        assert_eq!(ids(&findings), ["focus.string_min_length", "focus.string_max_length"]);
        assert_eq!(findings[0].sample_values.as_deref(), Some(&["ab".to_string()][..]));
        assert_eq!(findings[1].sample_values.as_deref(), Some(&["abcdef".to_string()][..]));
    }
}
