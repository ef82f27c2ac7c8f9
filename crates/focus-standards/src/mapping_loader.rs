//! Mapping configuration loading.
//!
//! Mapping files are YAML:
//!
//! ```yaml
//! spec_version: v1.2
//! validation:
//!   default:
//!     mode: permissive
//! mappings:
//!   BilledCost:
//!     description: Billed cost in billing currency
//!     steps:
//!       - op: from_column
//!         column: cost
//!       - op: cast
//!         to: decimal
//!         scale: 2
//!     validation:
//!       decimal:
//!         min: 0
//! ```
//!
//! Targets keep their file order. Steps are parsed into [`Step`] here, so an
//! unknown op fails the load instead of the run.

use std::path::Path;

use focus_model::{DatasetMetadata, MappingConfig, MappingRule, Step, ValidationSettings};
use serde_yaml::{Mapping, Value};

use crate::error::{Result, StandardsError};

pub fn load_mapping_config(path: &Path) -> Result<MappingConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    parse_mapping_config(&text)
}

pub fn parse_mapping_config(text: &str) -> Result<MappingConfig> {
    let raw: Value =
        serde_yaml::from_str(text).map_err(|source| StandardsError::MappingYaml { source })?;
    let Value::Mapping(root) = raw else {
        return Err(StandardsError::mapping(
            "mapping YAML must be a mapping at top level",
        ));
    };

    let spec_version = match root.get("spec_version") {
        Some(Value::String(v)) if !v.trim().is_empty() => v.clone(),
        _ => {
            return Err(StandardsError::mapping(
                "mapping.spec_version must be a non-empty string",
            ));
        }
    };

    let defaults = parse_validation_defaults(&root)?;
    let rules = parse_rules(&root)?;
    let metadata = parse_metadata(&root)?;

    MappingConfig::new(spec_version, rules)
        .map_err(|e| StandardsError::mapping(e.to_string()))
        .map(|mapping| {
            mapping
                .with_validation_defaults(defaults)
                .with_metadata(metadata)
        })
}

fn parse_validation_defaults(root: &Mapping) -> Result<ValidationSettings> {
    let validation = match root.get("validation") {
        None | Some(Value::Null) => return Ok(ValidationSettings::default()),
        Some(Value::Mapping(m)) => m,
        Some(_) => {
            return Err(StandardsError::mapping(
                "mapping.validation must be a mapping if provided",
            ));
        }
    };
    match validation.get("default") {
        None | Some(Value::Null) => Ok(ValidationSettings::default()),
        Some(value @ Value::Mapping(_)) => parse_settings(value, "mapping.validation.default"),
        Some(_) => Err(StandardsError::mapping(
            "mapping.validation.default must be a mapping if provided",
        )),
    }
}

fn parse_settings(value: &Value, location: &str) -> Result<ValidationSettings> {
    serde_yaml::from_value(value.clone())
        .map_err(|e| StandardsError::mapping(format!("{location}: {e}")))
}

fn parse_rules(root: &Mapping) -> Result<Vec<MappingRule>> {
    let mappings = match root.get("mappings") {
        Some(Value::Mapping(m)) if !m.is_empty() => m,
        _ => {
            return Err(StandardsError::mapping(
                "mapping.mappings must be a non-empty mapping",
            ));
        }
    };

    let mut rules = Vec::with_capacity(mappings.len());
    for (key, body) in mappings {
        let target = match key {
            Value::String(s) if !s.is_empty() => s.clone(),
            _ => {
                return Err(StandardsError::mapping(
                    "mapping.mappings keys must be non-empty strings",
                ));
            }
        };
        let Value::Mapping(body) = body else {
            return Err(StandardsError::mapping(format!(
                "mapping.mappings[{target}] must be a mapping"
            )));
        };
        let steps = parse_steps(&target, body)?;

        let validation = match body.get("validation") {
            None | Some(Value::Null) => None,
            Some(value @ Value::Mapping(_)) => Some(parse_settings(
                value,
                &format!("mapping.mappings[{target}].validation"),
            )?),
            Some(_) => {
                return Err(StandardsError::mapping(format!(
                    "mapping.mappings[{target}].validation must be a mapping if provided"
                )));
            }
        };
        let description = match body.get("description") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        rules.push(MappingRule {
            target,
            steps,
            description,
            validation,
        });
    }
    Ok(rules)
}

fn parse_steps(target: &str, body: &Mapping) -> Result<Vec<Step>> {
    let steps = match body.get("steps") {
        Some(Value::Sequence(seq)) if !seq.is_empty() => seq,
        _ => {
            return Err(StandardsError::mapping(format!(
                "mapping.mappings[{target}].steps must be a non-empty list"
            )));
        }
    };
    steps
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            let has_op = matches!(step, Value::Mapping(m) if m.contains_key("op"));
            if !has_op {
                return Err(StandardsError::mapping(format!(
                    "mapping.mappings[{target}].steps[{idx}] must include 'op'"
                )));
            }
            serde_yaml::from_value(step.clone()).map_err(|e| {
                StandardsError::mapping(format!("mapping.mappings[{target}].steps[{idx}]: {e}"))
            })
        })
        .collect()
}

fn parse_metadata(root: &Mapping) -> Result<DatasetMetadata> {
    let mut metadata = DatasetMetadata {
        creation_date: optional_string(root, "creation_date")?,
        dataset_instance_name: optional_string(root, "dataset_instance_name")?,
        ..DatasetMetadata::default()
    };
    if let Some(kind) = optional_string(root, "dataset_type")? {
        metadata.dataset_type = kind;
    }
    metadata.skipped_columns = match root.get("skipped_columns") {
        None | Some(Value::Null) => None,
        Some(Value::Sequence(seq)) => Some(
            seq.iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(StandardsError::mapping(
                        "mapping.skipped_columns must be a list of strings if provided",
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(_) => {
            return Err(StandardsError::mapping(
                "mapping.skipped_columns must be a list of strings if provided",
            ));
        }
    };
    Ok(metadata)
}

fn optional_string(root: &Mapping, key: &str) -> Result<Option<String>> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(StandardsError::mapping(format!(
            "mapping.{key} must be a string if provided"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_model::ValidationMode;

    #[test]
    fn rejects_non_mapping_top_level() {
        let err = parse_mapping_config("- a\n- b\n").unwrap_err();
        assert!(err.to_string().contains("top level"));
    }

    #[test]
    fn rejects_unknown_op_at_load() {
        let text = "spec_version: v1.2\nmappings:\n  BilledCost:\n    steps:\n      - op: explode\n";
        let err = parse_mapping_config(text).unwrap_err();
        assert!(err.to_string().contains("steps[0]"), "{err}");
    }

    #[test]
    fn rejects_empty_steps() {
        let text = "spec_version: v1.2\nmappings:\n  BilledCost:\n    steps: []\n";
        let err = parse_mapping_config(text).unwrap_err();
        assert!(err.to_string().contains("non-empty list"));
    }

    #[test]
    fn parses_defaults_and_overrides() {
        let text = r#"
spec_version: v1.2
validation:
  default:
    mode: permissive
mappings:
  ChargeCategory:
    steps:
      - op: const
        value: Usage
    validation:
      mode: strict
      allowed_values:
        case_insensitive: true
"#;
        let mapping = parse_mapping_config(text).unwrap();
        assert_eq!(
            mapping.validation_defaults.mode,
            Some(ValidationMode::Permissive)
        );
        let rule = mapping.rule_for_target("ChargeCategory").unwrap();
        let validation = rule.validation.as_ref().unwrap();
        assert_eq!(validation.mode, Some(ValidationMode::Strict));
        assert!(validation.case_insensitive_values());
    }
}
