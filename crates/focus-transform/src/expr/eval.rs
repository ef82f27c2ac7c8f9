//! Tree-walking evaluator for sandboxed expressions.
//!
//! Only the bound inputs are visible: the source table, the prior value and
//! the analytic helpers. Series operations are elementwise and scalars
//! broadcast against series.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::Datelike;
use focus_model::{ArithmeticOperator, CellValue, Table};
use regex::Regex;

use super::SandboxError;
use super::ast::{Attr, BinaryOp, BoolOp, CompareOp, Expr, Keyword, Literal, Name, UnaryOp};
use crate::datetime::cell_to_datetime;
use crate::numeric::{Number, parse_decimal, parse_i64};

#[derive(Debug, Clone)]
enum Value {
    Frame,
    Series(Vec<CellValue>),
    Scalar(CellValue),
    Pd,
    Conversion(Name),
    StrAccessor(Box<Value>),
    DtAccessor(Box<Value>),
    Method(Box<Value>, Attr),
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Frame => "DataFrame",
            Value::Series(_) => "Series",
            Value::Scalar(_) => "scalar",
            Value::Pd => "module",
            Value::Conversion(_) => "builtin",
            Value::StrAccessor(_) => "str accessor",
            Value::DtAccessor(_) => "dt accessor",
            Value::Method(..) => "method",
        }
    }
}

/// How a missing or unparsable value is handled by `to_numeric`/`to_datetime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorPolicy {
    Raise,
    Coerce,
    Ignore,
}

struct Args {
    positional: Vec<Value>,
    keywords: Vec<(Keyword, Value)>,
}

impl Args {
    fn allow(&self, method: &str, allowed: &[Keyword]) -> Result<(), SandboxError> {
        for (keyword, _) in &self.keywords {
            if !allowed.contains(keyword) {
                return Err(eval_error(format!(
                    "{method}() got an unexpected keyword argument"
                )));
            }
        }
        Ok(())
    }

    fn max_positional(&self, method: &str, max: usize) -> Result<(), SandboxError> {
        if self.positional.len() > max {
            return Err(eval_error(format!(
                "{method}() takes at most {max} positional arguments"
            )));
        }
        Ok(())
    }

    fn get(&self, index: usize, keyword: Option<Keyword>) -> Option<&Value> {
        keyword
            .and_then(|k| self.keywords.iter().find(|(kw, _)| *kw == k).map(|(_, v)| v))
            .or_else(|| self.positional.get(index))
    }

    fn scalar(&self, method: &str, index: usize, keyword: Option<Keyword>) -> Result<Option<CellValue>, SandboxError> {
        match self.get(index, keyword) {
            None => Ok(None),
            Some(Value::Scalar(cell)) => Ok(Some(cell.clone())),
            Some(other) => Err(eval_error(format!(
                "{method}() expects a scalar argument, got {}",
                other.describe()
            ))),
        }
    }

    fn text(&self, method: &str, index: usize) -> Result<String, SandboxError> {
        match self.scalar(method, index, None)? {
            Some(CellValue::Text(s)) => Ok(s),
            _ => Err(eval_error(format!("{method}() expects a string argument"))),
        }
    }

    fn integer(&self, method: &str, index: usize, keyword: Option<Keyword>) -> Result<Option<i64>, SandboxError> {
        match self.scalar(method, index, keyword)? {
            None | Some(CellValue::Null) => Ok(None),
            Some(CellValue::Int(i)) => Ok(Some(i)),
            Some(_) => Err(eval_error(format!("{method}() expects an integer argument"))),
        }
    }

    fn error_policy(&self, method: &str) -> Result<ErrorPolicy, SandboxError> {
        match self.scalar(method, usize::MAX, Some(Keyword::Errors))? {
            None => Ok(ErrorPolicy::Raise),
            Some(CellValue::Text(policy)) => match policy.as_str() {
                "raise" => Ok(ErrorPolicy::Raise),
                "coerce" => Ok(ErrorPolicy::Coerce),
                "ignore" => Ok(ErrorPolicy::Ignore),
                other => Err(eval_error(format!("invalid errors value '{other}'"))),
            },
            Some(_) => Err(eval_error("errors must be a string")),
        }
    }
}

fn eval_error(message: impl Into<String>) -> SandboxError {
    SandboxError::Eval(message.into())
}

pub(super) struct Evaluator<'a> {
    source: &'a Table,
    current: Option<&'a [CellValue]>,
}

impl<'a> Evaluator<'a> {
    pub(super) fn new(source: &'a Table, current: Option<&'a [CellValue]>) -> Self {
        Self { source, current }
    }

    /// Evaluate `expr` to one value per source row.
    pub(super) fn evaluate(&self, expr: &Expr) -> Result<Vec<CellValue>, SandboxError> {
        let rows = self.source.height();
        match self.eval(expr)? {
            Value::Series(values) if values.len() == rows => Ok(values),
            Value::Series(values) => Err(eval_error(format!(
                "expression produced {} values for {rows} rows",
                values.len()
            ))),
            Value::Scalar(cell) => Ok(vec![cell; rows]),
            other => Err(eval_error(format!(
                "expression must produce a column or a scalar, got {}",
                other.describe()
            ))),
        }
    }

    fn eval(&self, expr: &Expr) -> Result<Value, SandboxError> {
        match expr {
            Expr::Literal(literal) => Ok(Value::Scalar(literal_cell(literal))),
            Expr::Name(name) => Ok(self.resolve(*name)),
            Expr::Attribute { value, attr } => self.attribute(self.eval(value)?, *attr),
            Expr::Call { func, args, kwargs } => {
                let callee = self.eval(func)?;
                let args = Args {
                    positional: args.iter().map(|a| self.eval(a)).collect::<Result<_, _>>()?,
                    keywords: kwargs
                        .iter()
                        .map(|(k, e)| Ok((*k, self.eval(e)?)))
                        .collect::<Result<_, SandboxError>>()?,
                };
                self.call(callee, &args)
            }
            Expr::Index { value, index } => index_value(self.source, self.eval(value)?, self.eval(index)?),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                match op {
                    UnaryOp::Neg => map_cells(&operand, |cell| numeric_unary(cell, "-", |n| Some(n.negate()))),
                    UnaryOp::Pos => map_cells(&operand, |cell| numeric_unary(cell, "+", Some)),
                    UnaryOp::Not => map_cells(&operand, |cell| Ok(CellValue::Bool(!truthy(cell)))),
                }
            }
            Expr::Binary { op, left, right } => {
                let (left, right) = (self.eval(left)?, self.eval(right)?);
                zip_cells(&left, &right, |l, r| binary_cell(*op, l, r))
            }
            Expr::Compare { op, left, right } => {
                let (left, right) = (self.eval(left)?, self.eval(right)?);
                zip_cells(&left, &right, |l, r| compare_cells(*op, l, r).map(CellValue::Bool))
            }
            Expr::Bool { op, left, right } => {
                let (left, right) = (self.eval(left)?, self.eval(right)?);
                zip_cells(&left, &right, |l, r| {
                    Ok(CellValue::Bool(match op {
                        BoolOp::And => truthy(l) && truthy(r),
                        BoolOp::Or => truthy(l) || truthy(r),
                    }))
                })
            }
        }
    }

    fn resolve(&self, name: Name) -> Value {
        match name {
            Name::Df => Value::Frame,
            Name::Current => self
                .current
                .map_or(Value::Scalar(CellValue::Null), |values| Value::Series(values.to_vec())),
            Name::Pd => Value::Pd,
            Name::Str | Name::Int | Name::Float => Value::Conversion(name),
        }
    }

    fn attribute(&self, value: Value, attr: Attr) -> Result<Value, SandboxError> {
        match (value, attr) {
            (value @ (Value::Series(_) | Value::Scalar(_)), Attr::StrAccessor) => {
                Ok(Value::StrAccessor(Box::new(value)))
            }
            (value @ (Value::Series(_) | Value::Scalar(_)), Attr::DtAccessor) => {
                Ok(Value::DtAccessor(Box::new(value)))
            }
            (Value::DtAccessor(inner), Attr::Year | Attr::Month | Attr::Day | Attr::Date) => {
                map_cells(&inner, |cell| datetime_part(cell, attr))
            }
            (Value::Pd, Attr::ToNumeric | Attr::ToDatetime) => Ok(Value::Method(Box::new(Value::Pd), attr)),
            (value @ (Value::Series(_) | Value::Scalar(_) | Value::StrAccessor(_)), _) => {
                Ok(Value::Method(Box::new(value), attr))
            }
            (value, attr) => Err(eval_error(format!(
                "{} has no attribute '{}'",
                value.describe(),
                attr.as_str()
            ))),
        }
    }

    fn call(&self, callee: Value, args: &Args) -> Result<Value, SandboxError> {
        match callee {
            Value::Conversion(name) => convert(name, args),
            Value::Method(receiver, attr) => match *receiver {
                Value::Pd => call_pd(attr, args),
                Value::StrAccessor(inner) => call_str(&inner, attr, args),
                data => call_series(&data, attr, args),
            },
            other => Err(eval_error(format!("{} is not callable", other.describe()))),
        }
    }
}

fn literal_cell(literal: &Literal) -> CellValue {
    match literal {
        Literal::Int(i) => CellValue::Int(*i),
        Literal::Decimal(d) => CellValue::Decimal(*d),
        Literal::Str(s) => CellValue::Text(s.clone()),
        Literal::Bool(b) => CellValue::Bool(*b),
        Literal::None => CellValue::Null,
    }
}

fn index_value(source: &Table, value: Value, index: Value) -> Result<Value, SandboxError> {
    let Value::Scalar(key) = index else {
        return Err(eval_error("index must be a scalar"));
    };
    match (value, key) {
        (Value::Frame, CellValue::Text(name)) => source
            .column(&name)
            .map(|column| Value::Series(column.values().to_vec()))
            .ok_or_else(|| eval_error(format!("column '{name}' not found in source table"))),
        (Value::Series(values), CellValue::Int(i)) => {
            let len = i64::try_from(values.len()).unwrap_or(i64::MAX);
            let position = if i < 0 { len + i } else { i };
            usize::try_from(position)
                .ok()
                .and_then(|p| values.get(p))
                .map(|cell| Value::Scalar(cell.clone()))
                .ok_or_else(|| eval_error(format!("index {i} is out of bounds")))
        }
        (value, key) => Err(eval_error(format!(
            "{} cannot be indexed by {}",
            value.describe(),
            key.type_name()
        ))),
    }
}

fn map_cells<F>(value: &Value, mut f: F) -> Result<Value, SandboxError>
where
    F: FnMut(&CellValue) -> Result<CellValue, SandboxError>,
{
    match value {
        Value::Series(values) => values.iter().map(f).collect::<Result<_, _>>().map(Value::Series),
        Value::Scalar(cell) => f(cell).map(Value::Scalar),
        other => Err(eval_error(format!(
            "{} cannot be used as a value",
            other.describe()
        ))),
    }
}

fn zip_cells<F>(left: &Value, right: &Value, mut f: F) -> Result<Value, SandboxError>
where
    F: FnMut(&CellValue, &CellValue) -> Result<CellValue, SandboxError>,
{
    match (left, right) {
        (Value::Scalar(l), Value::Scalar(r)) => f(l, r).map(Value::Scalar),
        (Value::Series(ls), Value::Scalar(r)) => {
            ls.iter().map(|l| f(l, r)).collect::<Result<_, _>>().map(Value::Series)
        }
        (Value::Scalar(l), Value::Series(rs)) => {
            rs.iter().map(|r| f(l, r)).collect::<Result<_, _>>().map(Value::Series)
        }
        (Value::Series(ls), Value::Series(rs)) => {
            if ls.len() != rs.len() {
                return Err(eval_error(format!(
                    "operands have different lengths ({} and {})",
                    ls.len(),
                    rs.len()
                )));
            }
            ls.iter()
                .zip(rs)
                .map(|(l, r)| f(l, r))
                .collect::<Result<_, _>>()
                .map(Value::Series)
        }
        (l, r) => Err(eval_error(format!(
            "unsupported operands {} and {}",
            l.describe(),
            r.describe()
        ))),
    }
}

fn truthy(cell: &CellValue) -> bool {
    match cell {
        CellValue::Null => false,
        CellValue::Bool(b) => *b,
        CellValue::Int(i) => *i != 0,
        CellValue::Float(f) => *f != 0.0 && !f.is_nan(),
        CellValue::Decimal(d) => !d.is_zero(),
        CellValue::Text(s) => !s.is_empty(),
        CellValue::DateTime(_) => true,
        CellValue::Json(v) => !(v.is_null() || v.as_array().is_some_and(Vec::is_empty) || v.as_object().is_some_and(serde_json::Map::is_empty)),
    }
}

fn numeric_unary(cell: &CellValue, symbol: &str, f: impl Fn(Number) -> Option<Number>) -> Result<CellValue, SandboxError> {
    if cell.is_null() {
        return Ok(CellValue::Null);
    }
    Number::from_numeric_cell(cell)
        .map(|n| f(n).map_or(CellValue::Null, Number::into_cell))
        .ok_or_else(|| eval_error(format!("bad operand type for unary {symbol}: {}", cell.type_name())))
}

fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
    }
}

fn binary_cell(op: BinaryOp, left: &CellValue, right: &CellValue) -> Result<CellValue, SandboxError> {
    if left.is_null() || right.is_null() {
        return Ok(CellValue::Null);
    }
    if let (BinaryOp::Add, CellValue::Text(l), CellValue::Text(r)) = (op, left, right) {
        return Ok(CellValue::Text(format!("{l}{r}")));
    }
    let (Some(l), Some(r)) = (Number::from_numeric_cell(left), Number::from_numeric_cell(right)) else {
        return Err(eval_error(format!(
            "unsupported operand types for {}: {} and {}",
            binary_symbol(op),
            left.type_name(),
            right.type_name()
        )));
    };
    let result = match op {
        BinaryOp::Add => l.apply(ArithmeticOperator::Add, r),
        BinaryOp::Sub => l.apply(ArithmeticOperator::Sub, r),
        BinaryOp::Mul => l.apply(ArithmeticOperator::Mul, r),
        BinaryOp::Div => l.apply(ArithmeticOperator::Div, r),
        BinaryOp::Mod => l.modulo(r),
    };
    Ok(result.map_or(CellValue::Null, Number::into_cell))
}

fn order_cells(left: &CellValue, right: &CellValue) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (Number::from_numeric_cell(left), Number::from_numeric_cell(right)) {
        return l.compare(r);
    }
    match (left, right) {
        (CellValue::Text(l), CellValue::Text(r)) => Some(l.cmp(r)),
        (CellValue::DateTime(l), CellValue::DateTime(r)) => Some(l.cmp(r)),
        (CellValue::Json(l), CellValue::Json(r)) => (l == r).then_some(Ordering::Equal),
        _ => None,
    }
}

/// Nulls compare unequal to everything.
fn compare_cells(op: CompareOp, left: &CellValue, right: &CellValue) -> Result<bool, SandboxError> {
    if left.is_null() || right.is_null() {
        return Ok(op == CompareOp::NotEq);
    }
    let ordering = order_cells(left, right);
    match op {
        CompareOp::Eq => Ok(ordering == Some(Ordering::Equal)),
        CompareOp::NotEq => Ok(ordering != Some(Ordering::Equal)),
        _ => {
            let ordering = ordering.ok_or_else(|| {
                eval_error(format!(
                    "cannot order {} and {}",
                    left.type_name(),
                    right.type_name()
                ))
            })?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::LtEq => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn single_argument<'v>(name: &str, args: &'v Args) -> Result<&'v Value, SandboxError> {
    args.allow(name, &[])?;
    match args.positional.as_slice() {
        [value] => Ok(value),
        _ => Err(eval_error(format!("{name}() takes exactly one argument"))),
    }
}

fn convert(name: Name, args: &Args) -> Result<Value, SandboxError> {
    match name {
        Name::Str => map_cells(single_argument("str", args)?, |cell| {
            Ok(cell.to_lossless_string().map_or(CellValue::Null, CellValue::Text))
        }),
        Name::Int => map_cells(single_argument("int", args)?, |cell| {
            if cell.is_null() {
                return Ok(CellValue::Null);
            }
            let parsed = match cell {
                CellValue::Text(s) => parse_i64(s),
                other => Number::from_numeric_cell(other).and_then(Number::truncate),
            };
            parsed
                .map(CellValue::Int)
                .ok_or_else(|| eval_error(format!("invalid literal for int(): '{cell}'")))
        }),
        Name::Float => map_cells(single_argument("float", args)?, |cell| {
            if cell.is_null() {
                return Ok(CellValue::Null);
            }
            Number::from_cell(cell)
                .map(|n| CellValue::Float(n.to_f64()))
                .ok_or_else(|| eval_error(format!("could not convert to float: '{cell}'")))
        }),
        Name::Df | Name::Current | Name::Pd => Err(eval_error("object is not callable")),
    }
}

fn call_pd(attr: Attr, args: &Args) -> Result<Value, SandboxError> {
    match attr {
        Attr::ToNumeric => {
            args.allow("to_numeric", &[Keyword::Errors])?;
            args.max_positional("to_numeric", 1)?;
            let policy = args.error_policy("to_numeric")?;
            let input = args
                .positional
                .first()
                .ok_or_else(|| eval_error("to_numeric() missing argument"))?;
            map_cells(input, |cell| to_numeric_cell(cell, policy))
        }
        Attr::ToDatetime => {
            args.allow("to_datetime", &[Keyword::Errors, Keyword::Utc])?;
            args.max_positional("to_datetime", 1)?;
            let policy = args.error_policy("to_datetime")?;
            let input = args
                .positional
                .first()
                .ok_or_else(|| eval_error("to_datetime() missing argument"))?;
            map_cells(input, |cell| to_datetime_cell(cell, policy))
        }
        other => Err(eval_error(format!("module has no attribute '{}'", other.as_str()))),
    }
}

fn to_numeric_cell(cell: &CellValue, policy: ErrorPolicy) -> Result<CellValue, SandboxError> {
    if cell.is_null() {
        return Ok(CellValue::Null);
    }
    let parsed = match cell {
        CellValue::Text(s) if s.trim().is_empty() => return Ok(CellValue::Null),
        CellValue::Text(s) => parse_i64(s)
            .map(CellValue::Int)
            .or_else(|| parse_decimal(s).map(CellValue::Decimal)),
        other => Number::from_numeric_cell(other).map(Number::into_cell),
    };
    match (parsed, policy) {
        (Some(value), _) => Ok(value),
        (None, ErrorPolicy::Coerce) => Ok(CellValue::Null),
        (None, ErrorPolicy::Ignore) => Ok(cell.clone()),
        (None, ErrorPolicy::Raise) => Err(eval_error(format!("Unable to parse string \"{cell}\""))),
    }
}

fn to_datetime_cell(cell: &CellValue, policy: ErrorPolicy) -> Result<CellValue, SandboxError> {
    if cell.is_null() {
        return Ok(CellValue::Null);
    }
    if matches!(cell, CellValue::Text(s) if s.trim().is_empty()) {
        return Ok(CellValue::Null);
    }
    match (cell_to_datetime(cell), policy) {
        (Some(dt), _) => Ok(CellValue::DateTime(dt)),
        (None, ErrorPolicy::Coerce) => Ok(CellValue::Null),
        (None, ErrorPolicy::Ignore) => Ok(cell.clone()),
        (None, ErrorPolicy::Raise) => Err(eval_error(format!("Unknown datetime string format: \"{cell}\""))),
    }
}

fn datetime_part(cell: &CellValue, attr: Attr) -> Result<CellValue, SandboxError> {
    let dt = match cell {
        CellValue::Null => return Ok(CellValue::Null),
        CellValue::DateTime(dt) => dt,
        other => {
            return Err(eval_error(format!(
                "Can only use .dt accessor with datetimelike values, got {}",
                other.type_name()
            )));
        }
    };
    Ok(match attr {
        Attr::Year => CellValue::Int(i64::from(dt.year())),
        Attr::Month => CellValue::Int(i64::from(dt.month())),
        Attr::Day => CellValue::Int(i64::from(dt.day())),
        _ => CellValue::Text(dt.format("%Y-%m-%d").to_string()),
    })
}

/// Cells of a series, or the scalar as a one-row series.
fn cells(value: &Value) -> Result<(Vec<CellValue>, bool), SandboxError> {
    match value {
        Value::Series(values) => Ok((values.clone(), true)),
        Value::Scalar(cell) => Ok((vec![cell.clone()], false)),
        other => Err(eval_error(format!(
            "{} has no series methods",
            other.describe()
        ))),
    }
}

fn reshape(values: Vec<CellValue>, is_series: bool) -> Value {
    if is_series {
        Value::Series(values)
    } else {
        Value::Scalar(values.into_iter().next().unwrap_or(CellValue::Null))
    }
}

fn numbers(method: &str, values: &[CellValue]) -> Result<Vec<Number>, SandboxError> {
    values
        .iter()
        .filter(|cell| !cell.is_null())
        .map(|cell| {
            Number::from_numeric_cell(cell).ok_or_else(|| {
                eval_error(format!("{method}() requires numeric values, got {}", cell.type_name()))
            })
        })
        .collect()
}

fn sum_numbers(values: &[Number]) -> Number {
    values.iter().fold(Number::Int(0), |acc, n| {
        acc.apply(ArithmeticOperator::Add, *n)
            .unwrap_or(Number::Float(f64::NAN))
    })
}

fn extreme(values: &[CellValue], wanted: Ordering) -> Result<CellValue, SandboxError> {
    let mut best: Option<&CellValue> = None;
    for cell in values.iter().filter(|cell| !cell.is_null()) {
        best = match best {
            None => Some(cell),
            Some(current) => {
                let ordering = order_cells(cell, current).ok_or_else(|| {
                    eval_error(format!(
                        "cannot compare {} and {}",
                        cell.type_name(),
                        current.type_name()
                    ))
                })?;
                Some(if ordering == wanted { cell } else { current })
            }
        };
    }
    Ok(best.cloned().unwrap_or(CellValue::Null))
}

fn running<F>(values: &[CellValue], mut step: F) -> Result<Vec<CellValue>, SandboxError>
where
    F: FnMut(&CellValue, &CellValue) -> Result<CellValue, SandboxError>,
{
    let mut acc: Option<CellValue> = None;
    values
        .iter()
        .map(|cell| {
            if cell.is_null() {
                return Ok(CellValue::Null);
            }
            let next = match &acc {
                None => cell.clone(),
                Some(prev) => step(prev, cell)?,
            };
            acc = Some(next.clone());
            Ok(next)
        })
        .collect()
}

fn shifted(values: &[CellValue], periods: i64) -> Vec<CellValue> {
    let len = values.len();
    let offset = usize::try_from(periods.unsigned_abs()).unwrap_or(usize::MAX);
    (0..len)
        .map(|i| {
            let source = if periods >= 0 {
                i.checked_sub(offset)
            } else {
                i.checked_add(offset).filter(|s| *s < len)
            };
            source.map_or(CellValue::Null, |s| values[s].clone())
        })
        .collect()
}

fn call_series(receiver: &Value, attr: Attr, args: &Args) -> Result<Value, SandboxError> {
    let method = attr.as_str();
    let (values, is_series) = cells(receiver)?;
    match attr {
        Attr::Sum | Attr::Mean | Attr::Min | Attr::Max | Attr::Count | Attr::Nunique => {
            args.allow(method, &[])?;
            args.max_positional(method, 0)?;
            aggregate(attr, &values).map(Value::Scalar)
        }
        Attr::Abs => {
            args.allow(method, &[])?;
            args.max_positional(method, 0)?;
            map_cells(receiver, |cell| numeric_unary(cell, "abs", |n| Some(n.abs())))
        }
        Attr::Round => {
            args.allow(method, &[Keyword::Ndigits])?;
            args.max_positional(method, 1)?;
            let ndigits = args.integer(method, 0, Some(Keyword::Ndigits))?.unwrap_or(0);
            let ndigits = i32::try_from(ndigits).map_err(|_| eval_error("ndigits is out of range"))?;
            map_cells(receiver, |cell| numeric_unary(cell, "round", |n| n.round(ndigits)))
        }
        Attr::Fillna => {
            args.allow(method, &[])?;
            args.max_positional(method, 1)?;
            let fill = args
                .positional
                .first()
                .ok_or_else(|| eval_error("fillna() missing value"))?;
            zip_cells(receiver, fill, |cell, fill| {
                Ok(if cell.is_null() { fill.clone() } else { cell.clone() })
            })
        }
        Attr::Clip => {
            args.allow(method, &[])?;
            args.max_positional(method, 2)?;
            let lower = args.scalar(method, 0, None)?.filter(|c| !c.is_null());
            let upper = args.scalar(method, 1, None)?.filter(|c| !c.is_null());
            map_cells(receiver, |cell| clip_cell(cell, lower.as_ref(), upper.as_ref()))
        }
        Attr::Shift => {
            args.allow(method, &[])?;
            args.max_positional(method, 1)?;
            let periods = args.integer(method, 0, None)?.unwrap_or(1);
            Ok(reshape(shifted(&values, periods), is_series))
        }
        Attr::Diff => {
            args.allow(method, &[])?;
            args.max_positional(method, 1)?;
            let periods = args.integer(method, 0, None)?.unwrap_or(1);
            let previous = shifted(&values, periods);
            let diffs = values
                .iter()
                .zip(&previous)
                .map(|(cell, prev)| binary_cell(BinaryOp::Sub, cell, prev))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(reshape(diffs, is_series))
        }
        Attr::Cumsum | Attr::Cummax | Attr::Cummin => {
            args.allow(method, &[])?;
            args.max_positional(method, 0)?;
            numbers(method, &values)?;
            let out = running(&values, |prev, cell| match attr {
                Attr::Cumsum => binary_cell(BinaryOp::Add, prev, cell),
                Attr::Cummax => Ok(if order_cells(cell, prev) == Some(Ordering::Greater) { cell.clone() } else { prev.clone() }),
                _ => Ok(if order_cells(cell, prev) == Some(Ordering::Less) { cell.clone() } else { prev.clone() }),
            })?;
            Ok(reshape(out, is_series))
        }
        Attr::Add | Attr::Sub | Attr::Mul | Attr::Div => {
            args.allow(method, &[])?;
            let [other] = args.positional.as_slice() else {
                return Err(eval_error(format!("{method}() takes exactly one argument")));
            };
            let op = match attr {
                Attr::Add => BinaryOp::Add,
                Attr::Sub => BinaryOp::Sub,
                Attr::Mul => BinaryOp::Mul,
                _ => BinaryOp::Div,
            };
            zip_cells(receiver, other, |l, r| binary_cell(op, l, r))
        }
        other => Err(eval_error(format!(
            "{} has no method '{}'",
            receiver.describe(),
            other.as_str()
        ))),
    }
}

fn aggregate(attr: Attr, values: &[CellValue]) -> Result<CellValue, SandboxError> {
    let method = attr.as_str();
    match attr {
        Attr::Sum => Ok(sum_numbers(&numbers(method, values)?).into_cell()),
        Attr::Mean => {
            let nums = numbers(method, values)?;
            if nums.is_empty() {
                return Ok(CellValue::Null);
            }
            let count = i64::try_from(nums.len()).unwrap_or(i64::MAX);
            Ok(sum_numbers(&nums)
                .apply(ArithmeticOperator::Div, Number::Int(count))
                .map_or(CellValue::Null, Number::into_cell))
        }
        Attr::Min => extreme(values, Ordering::Less),
        Attr::Max => extreme(values, Ordering::Greater),
        Attr::Count => Ok(CellValue::Int(
            i64::try_from(values.iter().filter(|c| !c.is_null()).count()).unwrap_or(i64::MAX),
        )),
        _ => {
            let distinct: BTreeSet<(&str, String)> = values
                .iter()
                .filter_map(|c| Some((c.type_name(), c.to_lossless_string()?)))
                .collect();
            Ok(CellValue::Int(i64::try_from(distinct.len()).unwrap_or(i64::MAX)))
        }
    }
}

fn clip_cell(cell: &CellValue, lower: Option<&CellValue>, upper: Option<&CellValue>) -> Result<CellValue, SandboxError> {
    if cell.is_null() {
        return Ok(CellValue::Null);
    }
    let mut out = cell.clone();
    if let Some(lower) = lower
        && compare_cells(CompareOp::Lt, &out, lower)?
    {
        out = lower.clone();
    }
    if let Some(upper) = upper
        && compare_cells(CompareOp::Gt, &out, upper)?
    {
        out = upper.clone();
    }
    Ok(out)
}

fn python_slice(text: &str, start: Option<i64>, stop: Option<i64>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = i64::try_from(chars.len()).unwrap_or(i64::MAX);
    let clamp = |bound: i64| -> usize {
        let resolved = if bound < 0 { (len + bound).max(0) } else { bound.min(len) };
        usize::try_from(resolved).unwrap_or(0)
    };
    let from = start.map_or(0, clamp);
    let to = stop.map_or(chars.len(), clamp);
    if from >= to {
        return String::new();
    }
    chars[from..to].iter().collect()
}

fn call_str(receiver: &Value, attr: Attr, args: &Args) -> Result<Value, SandboxError> {
    let method = attr.as_str();
    args.allow(method, &[])?;
    let text_only = |f: &dyn Fn(&str) -> CellValue| {
        map_cells(receiver, |cell| {
            Ok(match cell {
                CellValue::Text(s) => f(s),
                _ => CellValue::Null,
            })
        })
    };
    match attr {
        Attr::Lower => text_only(&|s| CellValue::Text(s.to_lowercase())),
        Attr::Upper => text_only(&|s| CellValue::Text(s.to_uppercase())),
        Attr::Strip => text_only(&|s| CellValue::Text(s.trim().to_string())),
        Attr::Len => text_only(&|s| CellValue::Int(i64::try_from(s.chars().count()).unwrap_or(i64::MAX))),
        Attr::Contains => {
            args.max_positional(method, 1)?;
            let pattern = args.text(method, 0)?;
            let regex = Regex::new(&pattern)
                .map_err(|e| eval_error(format!("invalid pattern '{pattern}': {e}")))?;
            text_only(&|s| CellValue::Bool(regex.is_match(s)))
        }
        Attr::Startswith => {
            args.max_positional(method, 1)?;
            let prefix = args.text(method, 0)?;
            text_only(&|s| CellValue::Bool(s.starts_with(prefix.as_str())))
        }
        Attr::Endswith => {
            args.max_positional(method, 1)?;
            let suffix = args.text(method, 0)?;
            text_only(&|s| CellValue::Bool(s.ends_with(suffix.as_str())))
        }
        Attr::Replace => {
            args.max_positional(method, 2)?;
            let (from, to) = (args.text(method, 0)?, args.text(method, 1)?);
            text_only(&|s| CellValue::Text(s.replace(from.as_str(), &to)))
        }
        Attr::Slice => {
            args.max_positional(method, 2)?;
            let start = args.integer(method, 0, None)?;
            let stop = args.integer(method, 1, None)?;
            text_only(&|s| CellValue::Text(python_slice(s, start, stop)))
        }
        other => Err(eval_error(format!("str accessor has no method '{}'", other.as_str()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse_expression;
    use focus_model::Column;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn table() -> Table {
        Table::new(vec![
            Column::new(
                "Cost",
                vec![CellValue::text("1.50"), CellValue::text("x"), CellValue::Null],
            ),
            Column::new(
                "Qty",
                vec![CellValue::Int(2), CellValue::Int(3), CellValue::Int(4)],
            ),
            Column::from_text("Name", [Some(" Alpha "), Some("beta"), None]),
        ])
        .expect("table")
    }

    fn run(src: &str, current: Option<&[CellValue]>) -> Result<Vec<CellValue>, SandboxError> {
        let source = table();
        let expr = parse_expression(src)?;
        Evaluator::new(&source, current).evaluate(&expr)
    }

    #[test]
    fn to_numeric_with_coerce_keeps_decimals_exact() {
        let out = run(r#"pd.to_numeric(df["Cost"], errors="coerce")"#, None).unwrap();
        assert_eq!(
            out,
            vec![
                CellValue::Decimal(Decimal::from_str("1.50").unwrap()),
                CellValue::Null,
                CellValue::Null
            ]
        );
    }

    #[test]
    fn to_numeric_raises_by_default() {
        assert!(matches!(
            run(r#"pd.to_numeric(df["Cost"])"#, None),
            Err(SandboxError::Eval(_))
        ));
    }

    #[test]
    fn scalars_broadcast_and_aggregations_reduce() {
        assert_eq!(
            run(r#"df["Qty"] * 2"#, None).unwrap(),
            vec![CellValue::Int(4), CellValue::Int(6), CellValue::Int(8)]
        );
        assert_eq!(run(r#"df["Qty"].sum()"#, None).unwrap(), vec![CellValue::Int(9); 3]);
        assert_eq!(run(r#"df["Qty"].count() + 1"#, None).unwrap(), vec![CellValue::Int(4); 3]);
    }

    #[test]
    fn string_accessor_skips_non_text() {
        assert_eq!(
            run(r#"df["Name"].str.strip().str.upper()"#, None).unwrap(),
            vec![CellValue::text("ALPHA"), CellValue::text("BETA"), CellValue::Null]
        );
        assert_eq!(
            run(r#"df["Name"].str.contains("^b")"#, None).unwrap(),
            vec![CellValue::Bool(false), CellValue::Bool(true), CellValue::Null]
        );
        assert_eq!(
            run(r#"df["Name"].str.slice(0, 2)"#, None).unwrap(),
            vec![CellValue::text(" A"), CellValue::text("be"), CellValue::Null]
        );
    }

    #[test]
    fn current_defaults_to_null_scalar() {
        assert_eq!(run("current", None).unwrap(), vec![CellValue::Null; 3]);
        let prior = vec![CellValue::Int(1), CellValue::Null, CellValue::Int(3)];
        assert_eq!(
            run("current.fillna(0) + 1", Some(&prior)).unwrap(),
            vec![CellValue::Int(2), CellValue::Int(1), CellValue::Int(4)]
        );
    }

    #[test]
    fn comparisons_treat_null_as_unequal() {
        assert_eq!(
            run(r#"df["Name"] != "beta""#, None).unwrap(),
            vec![CellValue::Bool(true), CellValue::Bool(false), CellValue::Bool(true)]
        );
        assert_eq!(
            run(r#"(df["Qty"] > 2) and (df["Qty"] < 4)"#, None).unwrap(),
            vec![CellValue::Bool(false), CellValue::Bool(true), CellValue::Bool(false)]
        );
    }

    #[test]
    fn dt_accessor_extracts_parts() {
        assert_eq!(
            run(r#"pd.to_datetime("2024-03-05T10:00:00Z").dt.year"#, None).unwrap(),
            vec![CellValue::Int(2024); 3]
        );
        assert_eq!(
            run(r#"pd.to_datetime("2024-03-05").dt.date"#, None).unwrap(),
            vec![CellValue::text("2024-03-05"); 3]
        );
        assert!(run(r#"df["Qty"].dt.year"#, None).is_err());
    }

    #[test]
    fn sequence_methods() {
        assert_eq!(
            run(r#"df["Qty"].shift()"#, None).unwrap(),
            vec![CellValue::Null, CellValue::Int(2), CellValue::Int(3)]
        );
        assert_eq!(
            run(r#"df["Qty"].cumsum()"#, None).unwrap(),
            vec![CellValue::Int(2), CellValue::Int(5), CellValue::Int(9)]
        );
        assert_eq!(
            run(r#"df["Qty"].clip(3, None)"#, None).unwrap(),
            vec![CellValue::Int(3), CellValue::Int(3), CellValue::Int(4)]
        );
    }

    #[test]
    fn shape_and_lookup_errors() {
        assert!(matches!(run("df", None), Err(SandboxError::Eval(_))));
        assert!(matches!(run("pd", None), Err(SandboxError::Eval(_))));
        assert!(matches!(run(r#"df["Missing"]"#, None), Err(SandboxError::Eval(_))));
        assert!(matches!(run(r#"df["Name"] + 1"#, None), Err(SandboxError::Eval(_))));
    }

    #[test]
    fn division_by_zero_is_null() {
        assert_eq!(run(r#"df["Qty"] / 0"#, None).unwrap(), vec![CellValue::Null; 3]);
    }
}
