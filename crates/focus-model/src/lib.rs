pub mod error;
pub mod mapping;
pub mod report;
pub mod settings;
pub mod spec;
pub mod step;
pub mod table;

pub use error::{ModelError, Result};
pub use mapping::{DatasetMetadata, MappingConfig, MappingRule};
pub use report::{Severity, ValidationFinding, ValidationReport, ValidationSummary};
pub use settings::{
    AllowedValuesSettings, DateTimeSettings, DecimalSettings, Merge, NullableSettings,
    PresenceSettings, StringSettings, StructuredSettings, ValidationMode, ValidationSettings,
};
pub use spec::{
    ColumnSpec, DataType, EXTENSION_PREFIX, FeatureLevel, FocusSpec, is_extension_column,
    normalize_version, versions_match,
};
pub use step::{ArithmeticOperator, CastTarget, Operand, Step, is_read_only_query};
pub use table::{CellValue, Column, Table, format_datetime_iso8601};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts() {
        let report = ValidationReport::new(
            "1.2",
            vec![
                ValidationFinding::new("focus.column_present", Severity::Error, "missing")
                    .with_column("BilledCost"),
                ValidationFinding::new("focus.unknown_column", Severity::Warn, "unknown")
                    .with_column("Team"),
                ValidationFinding::new("focus.column_present", Severity::Info, "missing")
                    .with_column("Tags"),
            ],
        );
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(report.has_errors());
    }

    #[test]
    fn report_serializes() {
        let report = ValidationReport::new("1.2", vec![]);
        let json = serde_json::to_string(&report).expect("serialize report");
        let round: ValidationReport = serde_json::from_str(&json).expect("deserialize report");
        assert_eq!(round, report);
    }
}
