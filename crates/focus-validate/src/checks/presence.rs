//! Spec columns missing from the dataset.

use focus_model::{FeatureLevel, Severity, ValidationFinding};

use super::CheckContext;

fn severity_for(level: FeatureLevel) -> Severity {
    match level {
        FeatureLevel::Mandatory => Severity::Error,
        FeatureLevel::Conditional => Severity::Warn,
        FeatureLevel::Recommended | FeatureLevel::Optional => Severity::Info,
    }
}

pub fn check(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    ctx.spec
        .columns
        .iter()
        .filter(|spec| !ctx.table.contains(&spec.name))
        .filter(|spec| ctx.settings(&spec.name).enforce_presence() != Some(false))
        .map(|spec| {
            ValidationFinding::new(
                "focus.column_present",
                severity_for(spec.feature_level),
                "FOCUS column is missing from dataset",
            )
            .with_column(&spec.name)
        })
        .collect()
}
