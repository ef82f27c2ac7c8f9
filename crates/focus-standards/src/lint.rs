//! Static checks over a parsed mapping, run before any data is touched.

use focus_model::{FocusSpec, MappingConfig, Operand, Step, is_extension_column, is_read_only_query};

use crate::version::{has_dataset_metadata, versions_match};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingLint {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl MappingLint {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lint `mapping` against `spec`.
///
/// `check_expr` parses a sandboxed expression and returns the rejection
/// message, if any.
pub fn validate_mapping<F>(mapping: &MappingConfig, spec: &FocusSpec, check_expr: F) -> MappingLint
where
    F: Fn(&str) -> Result<(), String>,
{
    let mut lint = MappingLint::default();

    if !versions_match(&mapping.spec_version, &spec.version) {
        lint.errors.push(format!(
            "Mapping spec_version '{}' does not match spec version '{}'",
            mapping.spec_version, spec.version
        ));
    }

    for rule in mapping.rules() {
        let target = &rule.target;
        if !is_extension_column(target) && !spec.contains(target) {
            lint.errors.push(format!(
                "Target column '{target}' is not defined in FOCUS spec {}",
                spec.version
            ));
        }
        for (idx, step) in rule.steps.iter().enumerate() {
            let has_prior = idx > 0;
            for problem in step_problems(step, has_prior, &check_expr) {
                lint.errors
                    .push(format!("Column '{target}' step {}: {problem}", idx + 1));
            }
        }
    }

    if has_dataset_metadata(&mapping.spec_version) {
        if mapping.metadata.creation_date.is_none() {
            lint.warnings
                .push("v1.3+ mapping: 'creation_date' is recommended".to_string());
        }
        if mapping.metadata.dataset_instance_name.is_none() {
            lint.warnings
                .push("v1.3+ mapping: 'dataset_instance_name' is recommended".to_string());
        }
    }

    lint
}

fn step_problems<F>(step: &Step, has_prior: bool, check_expr: &F) -> Vec<String>
where
    F: Fn(&str) -> Result<(), String>,
{
    let mut problems = Vec::new();
    let op = step.op_name();
    match step {
        Step::FromColumn { column } | Step::Conditional { column, .. } if column.is_empty() => {
            problems.push(format!("'{op}' requires 'column'"));
        }
        Step::Coalesce { columns } | Step::Concat { columns, .. } if columns.is_empty() => {
            problems.push(format!("'{op}' requires 'columns'"));
        }
        Step::ValueLookup {
            column, mapping, ..
        } => {
            if mapping.is_empty() {
                problems.push(format!("'{op}' requires 'mapping'"));
            }
            if !has_prior && column.as_deref().is_none_or(str::is_empty) {
                problems.push(format!("'{op}' requires 'column' when it is the first step"));
            }
        }
        Step::Cast { .. } | Step::Round { .. } if !has_prior => {
            problems.push(format!("'{op}' requires a prior step"));
        }
        Step::Arithmetic { operator, operands } => {
            if operands.is_empty() {
                problems.push(format!("'{op}' requires 'operands'"));
            } else if operator.is_binary_only() && operands.len() != 2 {
                problems.push(format!(
                    "math operator {operator} requires exactly 2 operands"
                ));
            }
            if !has_prior && operands.iter().any(|o| matches!(o, Operand::Current)) {
                problems.push("math operand uses current but there is no prior step".to_string());
            }
        }
        Step::SandboxedExpr { expr } => {
            if expr.trim().is_empty() {
                problems.push(format!("'{op}' requires 'expr'"));
            } else if let Err(message) = check_expr(expr) {
                problems.push(message);
            }
        }
        Step::ExternalQuery { expr, query } => match (expr.as_deref(), query.as_deref()) {
            (Some(e), _) if !e.trim().is_empty() => {}
            (_, Some(q)) if !q.trim().is_empty() => {
                if !is_read_only_query(q) {
                    problems.push("sql query must start with SELECT or WITH".to_string());
                }
            }
            _ => problems.push(format!("'{op}' requires 'expr' or 'query'")),
        },
        _ => {}
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_model::{ArithmeticOperator, ColumnSpec, DataType, FeatureLevel, MappingRule};

    fn spec() -> FocusSpec {
        FocusSpec::new(
            "1.2",
            vec![ColumnSpec::new(
                "BilledCost",
                FeatureLevel::Mandatory,
                DataType::Decimal,
                false,
            )],
        )
    }

    fn accept_all(_: &str) -> Result<(), String> {
        Ok(())
    }

    #[test]
    fn unknown_target_is_an_error_but_extensions_pass() {
        let mapping = MappingConfig::new(
            "v1.2",
            vec![
                MappingRule::new("Team", vec![Step::Null]),
                MappingRule::new("x_Team", vec![Step::Null]),
            ],
        )
        .unwrap();
        let lint = validate_mapping(&mapping, &spec(), accept_all);
        assert_eq!(lint.errors.len(), 1);
        assert!(lint.errors[0].contains("'Team'"));
    }

    #[test]
    fn sub_with_three_operands_is_flagged() {
        let mapping = MappingConfig::new(
            "v1.2",
            vec![MappingRule::new(
                "BilledCost",
                vec![Step::Arithmetic {
                    operator: ArithmeticOperator::Sub,
                    operands: vec![
                        Operand::Column("a".to_string()),
                        Operand::Column("b".to_string()),
                        Operand::Column("c".to_string()),
                    ],
                }],
            )],
        )
        .unwrap();
        let lint = validate_mapping(&mapping, &spec(), accept_all);
        assert!(!lint.is_valid());
        assert!(lint.errors[0].contains("exactly 2 operands"));
    }

    #[test]
    fn rejected_expression_and_destructive_query_are_reported() {
        let mapping = MappingConfig::new(
            "v1.2",
            vec![
                MappingRule::new(
                    "BilledCost",
                    vec![Step::SandboxedExpr {
                        expr: "lambda x: x".to_string(),
                    }],
                ),
                MappingRule::new(
                    "x_Other",
                    vec![Step::ExternalQuery {
                        expr: None,
                        query: Some("DELETE FROM src".to_string()),
                    }],
                ),
            ],
        )
        .unwrap();
        let lint = validate_mapping(&mapping, &spec(), |expr| {
            if expr.contains("lambda") {
                Err("expression uses disallowed construct: lambda".to_string())
            } else {
                Ok(())
            }
        });
        assert_eq!(lint.errors.len(), 2);
        assert!(lint.errors[0].contains("lambda"));
        assert!(lint.errors[1].contains("SELECT or WITH"));
    }

    #[test]
    fn newer_versions_warn_about_missing_metadata() {
        let spec = FocusSpec::new("1.3", vec![]);
        let mapping =
            MappingConfig::new("v1.3", vec![MappingRule::new("x_A", vec![Step::Null])]).unwrap();
        let lint = validate_mapping(&mapping, &spec, accept_all);
        assert!(lint.is_valid());
        assert_eq!(lint.warnings.len(), 2);
    }
}
