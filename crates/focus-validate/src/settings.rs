//! Effective per-column validation settings.

use focus_model::{MappingConfig, Merge, ValidationSettings};

/// Engine defaults, then the mapping-wide defaults, then the rule override.
pub fn effective_settings(mapping: Option<&MappingConfig>, column: &str) -> ValidationSettings {
    let base = ValidationSettings::engine_defaults();
    let Some(mapping) = mapping else {
        return base;
    };
    let defaults = base.merge(&mapping.validation_defaults);
    match mapping
        .rule_for_target(column)
        .and_then(|rule| rule.validation.as_ref())
    {
        Some(overrides) => defaults.merge(overrides),
        None => defaults,
    }
}
