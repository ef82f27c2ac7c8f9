//! Produce a FOCUS table from a source table and a mapping.

use focus_model::{FocusSpec, MappingConfig, Table, versions_match};
use tracing::{debug, info, warn};

use crate::coerce::coerce_table_to_spec;
use crate::error::{Result, TransformError};
use crate::interpreter::StepInterpreter;
use crate::query::{PolarsSqlEngine, QueryEngine};

/// Generate with the polars SQL engine.
pub fn generate_focus_table(source: &Table, mapping: &MappingConfig, spec: &FocusSpec) -> Result<Table> {
    generate_focus_table_with(&PolarsSqlEngine, source, mapping, spec)
}

/// Run every mapping rule and coerce the result to the spec's types.
///
/// Spec columns with a rule come first in spec order, followed by extension
/// (`x_`) columns in mapping order. Rules for other targets are skipped.
pub fn generate_focus_table_with(
    engine: &dyn QueryEngine,
    source: &Table,
    mapping: &MappingConfig,
    spec: &FocusSpec,
) -> Result<Table> {
    if !versions_match(&mapping.spec_version, &spec.version) {
        return Err(TransformError::VersionMismatch {
            mapping: mapping.spec_version.clone(),
            spec: spec.version.clone(),
        });
    }
    info!(
        spec_version = %spec.version,
        rows = source.height(),
        rules = mapping.rules().len(),
        "generating FOCUS table"
    );

    let interpreter = StepInterpreter::new(engine);
    let mut output = Table::with_height(source.height());

    for column_spec in &spec.columns {
        if let Some(rule) = mapping.rule_for_target(&column_spec.name) {
            debug!(target_column = %rule.target, steps = rule.steps.len(), "mapping spec column");
            let column = interpreter.apply_steps(source, &rule.steps, &rule.target)?;
            output
                .push_column(column)
                .map_err(|e| TransformError::configuration(&rule.target, e.to_string()))?;
        }
    }

    for rule in mapping.rules() {
        if spec.contains(&rule.target) {
            if rule.is_extension() {
                return Err(TransformError::configuration(
                    &rule.target,
                    "extension column collides with a spec column",
                ));
            }
            continue;
        }
        if !rule.is_extension() {
            warn!(target_column = %rule.target, "target is not a spec or extension column, skipping");
            continue;
        }
        debug!(target_column = %rule.target, steps = rule.steps.len(), "mapping extension column");
        let column = interpreter.apply_steps(source, &rule.steps, &rule.target)?;
        output
            .push_column(column)
            .map_err(|e| TransformError::configuration(&rule.target, e.to_string()))?;
    }

    Ok(coerce_table_to_spec(&output, spec))
}
