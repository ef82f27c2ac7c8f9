//! In-memory table abstraction shared by the interpreter and the validator.
//!
//! A [`Table`] is a list of equally long named [`Column`]s. Cells are
//! [`CellValue`]s, which keep exact decimals, UTC timestamps and structured
//! JSON values side by side with plain text. Null and the empty string are
//! different values.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ModelError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Decimal(Decimal),
    DateTime(DateTime<Utc>),
    Json(JsonValue),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Float NaN is treated as missing, matching how tabular sources encode gaps.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Lossless string form of the value; `None` for null.
    pub fn to_lossless_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Float(v) if v.is_nan() => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(format!("{v:?}")),
            Self::Text(s) => Some(s.clone()),
            Self::Decimal(d) => Some(d.to_string()),
            Self::DateTime(dt) => Some(format_datetime_iso8601(dt)),
            Self::Json(v) => Some(v.to_string()),
        }
    }

    /// Converts a configuration literal into a cell.
    ///
    /// Non-integral numbers become exact decimals read from their shortest
    /// text form; only values outside the decimal range stay floats.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Ok(d) = n.to_string().parse::<Decimal>() {
                    Self::Decimal(d)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Text(n.to_string())
                }
            }
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => Self::Json(value.clone()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Decimal(_) => "decimal",
            Self::DateTime(_) => "datetime",
            Self::Json(_) => "json",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_lossless_string() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Format a UTC timestamp as ISO 8601 with a `Z` suffix.
///
/// Microseconds are only written when present.
pub fn format_datetime_iso8601(dt: &DateTime<Utc>) -> String {
    if dt.nanosecond() % 1_000_000_000 == 0 {
        dt.to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn broadcast(name: impl Into<String>, value: &CellValue, len: usize) -> Self {
        Self::new(name, vec![value.clone(); len])
    }

    /// Build a text column; `None` entries become null.
    pub fn from_text<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::new(
            name,
            values
                .into_iter()
                .map(|v| v.map_or(CellValue::Null, |s| CellValue::Text(s.into())))
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<CellValue> {
        self.values
    }

    pub fn get(&self, idx: usize) -> Option<&CellValue> {
        self.values.get(idx)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    /// Build a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, Column::len);
        let mut table = Self::with_height(height);
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// An empty table that expects `height` rows per column.
    pub fn with_height(height: usize) -> Self {
        Self {
            columns: Vec::new(),
            height,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.height {
            return Err(ModelError::ColumnLength {
                column: column.name,
                expected: self.height,
                actual: column.values.len(),
            });
        }
        if self.contains(&column.name) {
            return Err(ModelError::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Returns a table where `column` replaces the same-named column, or is appended.
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        if column.len() != self.height {
            return Err(ModelError::ColumnLength {
                column: column.name,
                expected: self.height,
                actual: column.values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(self)
    }

    /// A table of the same shape with each column's cells passed through `f`.
    ///
    /// `f` returns the cell mapper for a column, or `None` to keep it as is.
    pub fn map_columns<F, G>(&self, mut f: F) -> Table
    where
        F: FnMut(&Column) -> Option<G>,
        G: FnMut(&CellValue) -> CellValue,
    {
        let columns = self
            .columns
            .iter()
            .map(|column| match f(column) {
                Some(mut map) => Column::new(
                    column.name.clone(),
                    column.values.iter().map(&mut map).collect(),
                ),
                None => column.clone(),
            })
            .collect();
        Table {
            columns,
            height: self.height,
        }
    }
}
