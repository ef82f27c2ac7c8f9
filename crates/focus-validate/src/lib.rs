//! Rule-based validation of a FOCUS dataset.
//!
//! [`validate_focus_table`] never fails: every problem becomes a
//! [`ValidationFinding`](focus_model::ValidationFinding) and ERROR findings
//! are the only signal of non-compliance.

mod checks;
pub mod settings;
mod util;

use std::fs;
use std::path::{Path, PathBuf};

use checks::CheckContext;
use focus_model::{FocusSpec, MappingConfig, Table, ValidationReport};
use thiserror::Error;
use tracing::info;

pub use settings::effective_settings;
pub use util::SAMPLE_LIMIT;

/// Run every check against `table` and collect the findings.
///
/// `mapping` supplies the validation defaults and per-column overrides.
pub fn validate_focus_table(
    table: &Table,
    spec: &FocusSpec,
    mapping: Option<&MappingConfig>,
) -> ValidationReport {
    let ctx = CheckContext {
        table,
        spec,
        mapping,
    };
    let report = ValidationReport::new(&spec.version, checks::run_all(&ctx));
    info!(
        spec_version = %spec.version,
        errors = report.error_count(),
        warnings = report.warning_count(),
        findings = report.findings.len(),
        "validation finished"
    );
    report
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize validation report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write validation report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pretty-printed JSON form of `report`.
pub fn report_to_json(report: &ValidationReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Write `report` as pretty-printed JSON.
pub fn write_validation_report(report: &ValidationReport, path: &Path) -> Result<(), ReportError> {
    let mut json = report_to_json(report)?;
    json.push('\n');
    fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
