//! Restricted expression sandbox.
//!
//! Expressions are parsed into a closed syntax tree before anything runs.
//! Identifiers, attributes and keyword arguments outside a fixed allow-list
//! are rejected at parse time with the name of the offending construct.
//! Evaluation sees only the source table (`df`), the prior value
//! (`current`), the analytic helpers (`pd`) and the `str`/`int`/`float`
//! conversions.
//!
//! ```text
//! pd.to_numeric(df["ListCost"], errors="coerce").round(2)
//! df["ServiceName"].str.strip().str.upper()
//! current.fillna(0) * 1.2
//! ```

mod ast;
mod eval;
mod lexer;
mod parser;

use focus_model::{CellValue, Table};
use thiserror::Error;

pub use ast::Expr;
pub use parser::parse_expression;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("expression uses disallowed construct: {0}")]
    Rejected(String),

    #[error("invalid expression syntax: {0}")]
    Syntax(String),

    #[error("expression evaluation failed: {0}")]
    Eval(String),
}

/// Parse and evaluate `source` against `table`.
///
/// The result always has one value per row; scalars are broadcast.
pub fn evaluate(
    source: &str,
    table: &Table,
    current: Option<&[CellValue]>,
) -> Result<Vec<CellValue>, SandboxError> {
    let expr = parse_expression(source)?;
    evaluate_parsed(&expr, table, current)
}

pub fn evaluate_parsed(
    expr: &Expr,
    table: &Table,
    current: Option<&[CellValue]>,
) -> Result<Vec<CellValue>, SandboxError> {
    eval::Evaluator::new(table, current).evaluate(expr)
}

/// Parse-only check used by mapping lint.
pub fn check_expression(source: &str) -> Result<(), String> {
    parse_expression(source).map(|_| ()).map_err(|e| e.to_string())
}
