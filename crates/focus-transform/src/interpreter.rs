//! Step interpreter.
//!
//! Runs the ordered step list of one mapping rule against the source table
//! and produces a single output column with one value per source row. Each
//! step sees the value produced by the step before it (`current`).
//!
//! Configuration problems (missing parameters, a step that needs a prior
//! value running first) are reported as [`TransformError::Configuration`];
//! failures while evaluating expressions or queries are
//! [`TransformError::Execution`]. A source column that does not exist is not
//! an error: it reads as all-null.

use std::cmp::Ordering;

use focus_model::{ArithmeticOperator, CastTarget, CellValue, Column, Operand, Step, Table};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::datetime::cell_to_datetime;
use crate::error::{Result, TransformError};
use crate::expr;
use crate::numeric::{Number, cell_to_decimal, decimal_precision, quantize};
use crate::query::{PolarsSqlEngine, QueryEngine, QueryRequest};

/// Where a step sits, for error messages.
struct StepContext<'a> {
    source: &'a Table,
    target: &'a str,
    index: usize,
    op: &'static str,
}

impl StepContext<'_> {
    fn configuration(&self, message: impl std::fmt::Display) -> TransformError {
        TransformError::configuration(
            self.target,
            format!("step {} ({}): {message}", self.index, self.op),
        )
    }

    fn execution(&self, message: impl std::fmt::Display) -> TransformError {
        TransformError::execution(
            self.target,
            format!("step {} ({}): {message}", self.index, self.op),
        )
    }

    fn rows(&self) -> usize {
        self.source.height()
    }

    fn nulls(&self) -> Vec<CellValue> {
        vec![CellValue::Null; self.rows()]
    }

    /// Values of a source column; an absent column reads as all-null.
    fn source_values(&self, column: &str) -> Vec<CellValue> {
        match self.source.column(column) {
            Some(values) => values.values().to_vec(),
            None => {
                warn!(
                    column,
                    target_column = self.target,
                    "source column not found, using nulls"
                );
                self.nulls()
            }
        }
    }

    fn require_current<'v>(&self, current: Option<&'v [CellValue]>) -> Result<&'v [CellValue]> {
        current.ok_or_else(|| self.configuration("requires a prior value"))
    }
}

/// Executes mapping steps, delegating `sql` steps to a [`QueryEngine`].
pub struct StepInterpreter<'e> {
    engine: &'e dyn QueryEngine,
}

impl Default for StepInterpreter<'static> {
    fn default() -> Self {
        Self::new(&PolarsSqlEngine)
    }
}

impl<'e> StepInterpreter<'e> {
    pub fn new(engine: &'e dyn QueryEngine) -> Self {
        Self { engine }
    }

    /// Run `steps` in order and return the column for `target`.
    ///
    /// An empty step list yields an all-null column.
    pub fn apply_steps(&self, source: &Table, steps: &[Step], target: &str) -> Result<Column> {
        let mut current: Option<Vec<CellValue>> = None;
        for (idx, step) in steps.iter().enumerate() {
            let ctx = StepContext {
                source,
                target,
                index: idx + 1,
                op: step.op_name(),
            };
            debug!(target_column = target, step = ctx.index, op = ctx.op, "applying step");
            let values = self.apply_step(&ctx, step, current.as_deref())?;
            if values.len() != ctx.rows() {
                return Err(ctx.execution(format!(
                    "produced {} values for {} rows",
                    values.len(),
                    ctx.rows()
                )));
            }
            current = Some(values);
        }
        let values = current.unwrap_or_else(|| vec![CellValue::Null; source.height()]);
        Ok(Column::new(target, values))
    }

    fn apply_step(&self, ctx: &StepContext<'_>, step: &Step, current: Option<&[CellValue]>) -> Result<Vec<CellValue>> {
        match step {
            Step::FromColumn { column } => {
                if column.is_empty() {
                    return Err(ctx.configuration("requires 'column'"));
                }
                Ok(ctx.source_values(column))
            }
            Step::Constant { value } => Ok(vec![CellValue::from_json(value); ctx.rows()]),
            Step::Null => Ok(ctx.nulls()),
            Step::Coalesce { columns } => coalesce(ctx, columns),
            Step::ValueLookup {
                column,
                mapping,
                default,
            } => {
                let base = match (current, column.as_deref()) {
                    (Some(values), _) => values.to_vec(),
                    (None, Some(name)) if !name.is_empty() => ctx.source_values(name),
                    (None, _) => {
                        return Err(ctx.configuration("requires a prior value or 'column'"));
                    }
                };
                if mapping.is_empty() {
                    return Err(ctx.configuration("requires a non-empty 'mapping'"));
                }
                let fallback = default.as_ref().map_or(CellValue::Null, CellValue::from_json);
                Ok(base
                    .iter()
                    .map(|cell| {
                        cell.to_lossless_string()
                            .and_then(|key| mapping.get(&key))
                            .map(CellValue::from_json)
                            .filter(|mapped| !mapped.is_null())
                            .unwrap_or_else(|| fallback.clone())
                    })
                    .collect())
            }
            Step::Concat { columns, sep } => concat(ctx, columns, sep),
            Step::Cast {
                to,
                scale,
                precision,
            } => {
                let values = ctx.require_current(current)?;
                Ok(values
                    .iter()
                    .map(|cell| cast_value(cell, *to, *scale, *precision))
                    .collect())
            }
            Step::Round { ndigits } => {
                let values = ctx.require_current(current)?;
                Ok(values
                    .iter()
                    .map(|cell| {
                        Number::from_cell(cell)
                            .and_then(|n| n.round(*ndigits))
                            .map_or(CellValue::Null, Number::into_cell)
                    })
                    .collect())
            }
            Step::Arithmetic { operator, operands } => arithmetic(ctx, *operator, operands, current),
            Step::Conditional {
                column,
                value,
                then,
                otherwise,
            } => {
                if column.is_empty() {
                    return Err(ctx.configuration("requires 'column'"));
                }
                let expected = CellValue::from_json(value);
                let (then, otherwise) = (CellValue::from_json(then), CellValue::from_json(otherwise));
                Ok(ctx
                    .source_values(column)
                    .iter()
                    .map(|cell| {
                        if cells_match(cell, &expected) {
                            then.clone()
                        } else {
                            otherwise.clone()
                        }
                    })
                    .collect())
            }
            Step::SandboxedExpr { expr } => {
                if expr.trim().is_empty() {
                    return Err(ctx.configuration("requires a non-empty 'expr'"));
                }
                expr::evaluate(expr, ctx.source, current).map_err(|e| ctx.execution(e))
            }
            Step::ExternalQuery { expr, query } => {
                let request = match (non_empty(expr.as_deref()), non_empty(query.as_deref())) {
                    (Some(expr), _) => QueryRequest::Expression(expr),
                    (None, Some(query)) => QueryRequest::Query(query),
                    (None, None) => return Err(ctx.configuration("requires 'expr' or 'query'")),
                };
                let values = self
                    .engine
                    .run(ctx.source, &request)
                    .map_err(|e| ctx.execution(format!("sql failed: {e}")))?;
                if values.len() != ctx.rows() {
                    return Err(ctx.execution(format!(
                        "sql returned {} rows for {} source rows",
                        values.len(),
                        ctx.rows()
                    )));
                }
                Ok(values)
            }
        }
    }
}

/// Run `steps` with the polars SQL engine.
pub fn apply_steps(source: &Table, steps: &[Step], target: &str) -> Result<Column> {
    StepInterpreter::default().apply_steps(source, steps, target)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn coalesce(ctx: &StepContext<'_>, columns: &[String]) -> Result<Vec<CellValue>> {
    if columns.is_empty() {
        return Err(ctx.configuration("requires 'columns'"));
    }
    let mut out = ctx.nulls();
    for name in columns {
        for (slot, cell) in out.iter_mut().zip(ctx.source_values(name)) {
            if slot.is_null() {
                *slot = cell;
            }
        }
    }
    Ok(out)
}

/// A single column keeps its nulls; with several, nulls join as "".
fn concat(ctx: &StepContext<'_>, columns: &[String], sep: &str) -> Result<Vec<CellValue>> {
    if columns.is_empty() {
        return Err(ctx.configuration("requires 'columns'"));
    }
    let parts: Vec<Vec<CellValue>> = columns.iter().map(|name| ctx.source_values(name)).collect();
    if let [only] = parts.as_slice() {
        return Ok(only
            .iter()
            .map(|cell| cell.to_lossless_string().map_or(CellValue::Null, CellValue::Text))
            .collect());
    }
    Ok((0..ctx.rows())
        .map(|row| {
            let joined = parts
                .iter()
                .map(|part| part[row].to_lossless_string().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(sep);
            CellValue::Text(joined)
        })
        .collect())
}

fn cast_value(cell: &CellValue, to: CastTarget, scale: Option<u32>, precision: Option<u32>) -> CellValue {
    if cell.is_null() {
        return CellValue::Null;
    }
    match to {
        CastTarget::String | CastTarget::Json => {
            cell.to_lossless_string().map_or(CellValue::Null, CellValue::Text)
        }
        CastTarget::Float => {
            Number::from_cell(cell).map_or(CellValue::Null, |n| CellValue::Float(n.to_f64()))
        }
        CastTarget::Int => Number::from_cell(cell)
            .and_then(Number::truncate)
            .map_or(CellValue::Null, CellValue::Int),
        CastTarget::Datetime => cell_to_datetime(cell).map_or(CellValue::Null, CellValue::DateTime),
        CastTarget::Decimal => {
            let Some(mut value) = cell_to_decimal(cell) else {
                return CellValue::Null;
            };
            if let Some(scale) = scale {
                value = quantize(value, scale);
            }
            match precision {
                Some(limit) if decimal_precision(&value) > limit => CellValue::Null,
                _ => CellValue::Decimal(value),
            }
        }
    }
}

fn arithmetic(
    ctx: &StepContext<'_>,
    operator: ArithmeticOperator,
    operands: &[Operand],
    current: Option<&[CellValue]>,
) -> Result<Vec<CellValue>> {
    if operands.is_empty() {
        return Err(ctx.configuration("requires at least one operand"));
    }
    if operator.is_binary_only() && operands.len() != 2 {
        return Err(ctx.configuration(format!(
            "operator {operator} requires exactly 2 operands"
        )));
    }
    let resolved = operands
        .iter()
        .map(|operand| resolve_operand(ctx, operand, current))
        .collect::<Result<Vec<_>>>()?;

    let mut columns = resolved.into_iter();
    let Some(first) = columns.next() else {
        return Ok(ctx.nulls());
    };
    let folded = columns.fold(first, |acc, next| {
        acc.into_iter()
            .zip(next)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a.apply(operator, b),
                _ => None,
            })
            .collect()
    });
    Ok(folded
        .into_iter()
        .map(|n| n.map_or(CellValue::Null, Number::into_cell))
        .collect())
}

fn resolve_operand(
    ctx: &StepContext<'_>,
    operand: &Operand,
    current: Option<&[CellValue]>,
) -> Result<Vec<Option<Number>>> {
    let numeric = |values: &[CellValue]| -> Vec<Option<Number>> {
        values.iter().map(Number::from_cell).collect()
    };
    match operand {
        Operand::Current => {
            let values = current.ok_or_else(|| ctx.configuration("operand uses current but there is no prior value"))?;
            Ok(numeric(values))
        }
        Operand::Column(name) => Ok(numeric(&ctx.source_values(name))),
        Operand::Constant(value) => {
            let number = constant_number(value);
            Ok(vec![number; ctx.rows()])
        }
    }
}

fn constant_number(value: &JsonValue) -> Option<Number> {
    Number::from_cell(&CellValue::from_json(value))
}

/// Nulls never match. Numbers compare by value, everything else by its
/// lossless string form.
fn cells_match(cell: &CellValue, expected: &CellValue) -> bool {
    if cell.is_null() || expected.is_null() {
        return false;
    }
    let is_number = |c: &CellValue| matches!(c, CellValue::Int(_) | CellValue::Float(_) | CellValue::Decimal(_));
    if is_number(cell) && is_number(expected) {
        let pair = (Number::from_numeric_cell(cell), Number::from_numeric_cell(expected));
        if let (Some(a), Some(b)) = pair {
            return a.compare(b) == Some(Ordering::Equal);
        }
    }
    cell.to_lossless_string() == expected.to_lossless_string()
}
