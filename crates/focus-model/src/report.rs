use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule violation or informational note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// Stable check identifier (e.g. `focus.not_null`).
    pub check_id: String,
    pub severity: Severity,
    pub message: String,
    pub column: Option<String>,
    pub failing_rows: Option<usize>,
    /// Up to a handful of failing values, in row order.
    pub sample_values: Option<Vec<String>>,
}

impl ValidationFinding {
    pub fn new(check_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            severity,
            message: message.into(),
            column: None,
            failing_rows: None,
            sample_values: None,
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_failures(mut self, failing_rows: usize, samples: Vec<String>) -> Self {
        self.failing_rows = Some(failing_rows);
        self.sample_values = Some(samples);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub spec_version: String,
    pub summary: ValidationSummary,
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    /// Build a report; INFO findings count toward neither total.
    pub fn new(spec_version: impl Into<String>, findings: Vec<ValidationFinding>) -> Self {
        let summary = ValidationSummary {
            errors: findings
                .iter()
                .filter(|f| f.severity == Severity::Error)
                .count(),
            warnings: findings
                .iter()
                .filter(|f| f.severity == Severity::Warn)
                .count(),
        };
        Self {
            spec_version: spec_version.into(),
            summary,
            findings,
        }
    }

    pub fn error_count(&self) -> usize {
        self.summary.errors
    }

    pub fn warning_count(&self) -> usize {
        self.summary.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn findings_for<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a ValidationFinding> {
        self.findings
            .iter()
            .filter(move |f| f.column.as_deref() == Some(column))
    }
}
