//! Canonical type coercion for spec-declared columns.

use focus_model::{CellValue, Column, DataType, FocusSpec, Table};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::datetime::cell_to_datetime;
use crate::numeric::cell_to_decimal;

/// Convert one cell to the canonical representation of `data_type`.
///
/// Values that cannot be converted become null.
pub fn coerce_value(value: &CellValue, data_type: DataType) -> CellValue {
    if value.is_null() {
        return CellValue::Null;
    }
    match data_type {
        DataType::String => match value {
            CellValue::Text(_) => value.clone(),
            other => other.to_lossless_string().map_or(CellValue::Null, CellValue::Text),
        },
        DataType::DateTime => cell_to_datetime(value).map_or(CellValue::Null, CellValue::DateTime),
        DataType::Decimal => cell_to_decimal(value).map_or(CellValue::Null, CellValue::Decimal),
        DataType::Structured => coerce_structured(value),
    }
}

fn coerce_structured(value: &CellValue) -> CellValue {
    match value {
        CellValue::Json(_) => value.clone(),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return CellValue::Null;
            }
            match serde_json::from_str::<JsonValue>(trimmed) {
                Ok(JsonValue::Null) | Err(_) => CellValue::Null,
                Ok(parsed) => CellValue::Json(parsed),
            }
        }
        _ => CellValue::Null,
    }
}

pub fn coerce_column(column: &Column, data_type: DataType) -> Column {
    Column::new(
        column.name(),
        column
            .values()
            .iter()
            .map(|v| coerce_value(v, data_type))
            .collect(),
    )
}

/// Coerce every spec column present in `table`; other columns are left untouched.
pub fn coerce_table_to_spec(table: &Table, spec: &FocusSpec) -> Table {
    table.map_columns(|column| {
        let data_type = spec.column(column.name())?.data_type;
        debug!(column = column.name(), %data_type, "coercing column");
        Some(move |value: &CellValue| coerce_value(value, data_type))
    })
}
