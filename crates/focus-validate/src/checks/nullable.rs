//! Nulls in columns that disallow them.

use focus_model::{CellValue, ValidationFinding};

use super::CheckContext;
use crate::util::collect_failures;

pub fn check(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for (spec, column) in ctx.present_columns() {
        // An explicit override decides; otherwise the spec does.
        let allows_nulls = ctx
            .settings(&spec.name)
            .allow_nulls()
            .unwrap_or(spec.allows_nulls);
        if allows_nulls {
            continue;
        }
        let failures = collect_failures(column.values(), CellValue::is_null);
        findings.extend(failures.into_finding(
            "focus.not_null",
            "Column disallows nulls but contains null values",
            &spec.name,
        ));
    }
    findings
}
