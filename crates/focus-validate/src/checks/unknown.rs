//! Columns outside the schema without the extension prefix.

use focus_model::{Severity, ValidationFinding, is_extension_column};

use super::CheckContext;

pub fn check(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    ctx.table
        .column_names()
        .into_iter()
        .filter(|name| !is_extension_column(name) && !ctx.spec.contains(name))
        .map(|name| {
            ValidationFinding::new(
                "focus.unknown_column",
                Severity::Warn,
                "Column is not in FOCUS schema and does not use x_ extension prefix",
            )
            .with_column(name)
        })
        .collect()
}
