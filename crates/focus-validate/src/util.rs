//! Failure counting shared by the checks.

use focus_model::{CellValue, Severity, ValidationFinding};

/// Most failing values quoted per finding.
pub const SAMPLE_LIMIT: usize = 5;

/// Failing row count plus the first few failing values in row order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Failures {
    pub count: usize,
    pub samples: Vec<String>,
}

impl Failures {
    pub fn record(&mut self, value: &CellValue) {
        self.count += 1;
        if self.samples.len() < SAMPLE_LIMIT
            && let Some(text) = value.to_lossless_string()
        {
            self.samples.push(text);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// An ERROR finding for `column`, or `None` when nothing failed.
    pub fn into_finding(
        self,
        check_id: &str,
        message: &str,
        column: &str,
    ) -> Option<ValidationFinding> {
        if self.is_empty() {
            return None;
        }
        Some(
            ValidationFinding::new(check_id, Severity::Error, message)
                .with_column(column)
                .with_failures(self.count, self.samples),
        )
    }
}

/// Collect the values for which `fails` holds.
pub fn collect_failures<'a, I, F>(values: I, mut fails: F) -> Failures
where
    I: IntoIterator<Item = &'a CellValue>,
    F: FnMut(&CellValue) -> bool,
{
    let mut failures = Failures::default();
    for value in values {
        if fails(value) {
            failures.record(value);
        }
    }
    failures
}
