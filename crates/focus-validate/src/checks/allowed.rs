//! Membership in the spec's allowed value set.

use std::collections::BTreeSet;

use focus_model::ValidationFinding;

use super::CheckContext;
use crate::util::collect_failures;

pub fn check(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for (spec, column) in ctx.present_columns() {
        let Some(allowed) = spec.allowed_values.as_deref() else {
            continue;
        };
        if allowed.is_empty() {
            continue;
        }
        let case_insensitive = ctx.settings(&spec.name).case_insensitive_values();
        let fold = |value: &str| {
            if case_insensitive {
                value.to_lowercase()
            } else {
                value.to_string()
            }
        };
        let allowed: BTreeSet<String> = allowed.iter().map(|v| fold(v)).collect();

        let failures = collect_failures(column.values(), |value| {
            value
                .to_lossless_string()
                .is_some_and(|text| !allowed.contains(&fold(&text)))
        });
        findings.extend(failures.into_finding(
            "focus.allowed_values",
            "Column contains values outside allowed set",
            &spec.name,
        ));
    }
    findings
}
