//! Date/time parsing normalized to UTC.
//!
//! Offsets are converted to UTC; values without an offset are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use focus_model::CellValue;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%b-%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

/// Parse common date/time spellings into UTC.
pub fn parse_datetime_utc(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = trimmed.strip_suffix('Z').and_then(parse_naive) {
        return Some(naive.and_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    parse_naive(trimmed).map(|naive| naive.and_utc())
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse with an explicit chrono pattern; patterns without an offset read as UTC.
pub fn parse_datetime_with_format(value: &str, format: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, format)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// UTC timestamp view of a cell. Numbers are not read as epochs.
pub fn cell_to_datetime(value: &CellValue) -> Option<DateTime<Utc>> {
    match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Text(s) => parse_datetime_utc(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn offsets_are_converted_to_utc() {
        let parsed = parse_datetime_utc("2024-01-01T12:00:00+05:30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 6, 30, 0).unwrap());
    }

    #[test]
    fn naive_values_are_taken_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_datetime_utc("2024-01-01 12:00:00"), Some(expected));
        assert_eq!(parse_datetime_utc("2024-01-01T12:00:00Z"), Some(expected));
        assert_eq!(
            parse_datetime_utc("2024-01-01"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_datetime_utc("not a date"), None);
        assert_eq!(parse_datetime_utc(""), None);
        assert_eq!(cell_to_datetime(&CellValue::Int(1_704_067_200)), None);
    }

    #[test]
    fn explicit_format() {
        let parsed = parse_datetime_with_format("01/02/2024", "%d/%m/%Y").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(parse_datetime_with_format("2024-02-01", "%d/%m/%Y"), None);
    }
}
