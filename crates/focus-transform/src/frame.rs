//! Conversion between [`Table`] and polars `DataFrame`s.

use chrono::{DateTime, Utc};
use focus_model::{CellValue, Column, Table};
use polars::prelude::{
    AnyValue, Column as PlColumn, DataFrame, DataType as PlDataType, PlSmallStr, TimeUnit,
};

use crate::error::FrameError;
use crate::numeric::Number;

/// Polars type a column of cells is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Bool,
    Int,
    Float,
    DateTime,
    Text,
}

fn storage_for(values: &[CellValue]) -> Storage {
    let mut storage: Option<Storage> = None;
    for value in values.iter().filter(|v| !v.is_null()) {
        let kind = match value {
            CellValue::Bool(_) => Storage::Bool,
            CellValue::Int(_) => Storage::Int,
            CellValue::Float(_) => Storage::Float,
            CellValue::DateTime(_) => Storage::DateTime,
            _ => return Storage::Text,
        };
        storage = Some(match (storage, kind) {
            (None, kind) => kind,
            (Some(a), b) if a == b => a,
            (Some(Storage::Int | Storage::Float), Storage::Int | Storage::Float) => Storage::Float,
            _ => return Storage::Text,
        });
    }
    storage.unwrap_or(Storage::Text)
}

fn to_polars_column(column: &Column) -> Result<PlColumn, FrameError> {
    let name: PlSmallStr = column.name().into();
    let values = column.values();
    let converted = match storage_for(values) {
        Storage::Bool => PlColumn::new(
            name,
            values
                .iter()
                .map(|v| match v {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        Storage::Int => PlColumn::new(
            name,
            values
                .iter()
                .map(|v| match v {
                    CellValue::Int(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        Storage::Float => PlColumn::new(
            name,
            values
                .iter()
                .map(|v| Number::from_numeric_cell(v).map(Number::to_f64))
                .collect::<Vec<_>>(),
        ),
        Storage::DateTime => PlColumn::new(
            name,
            values
                .iter()
                .map(|v| match v {
                    CellValue::DateTime(dt) => Some(dt.timestamp_micros()),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )
        .cast(&PlDataType::Datetime(TimeUnit::Microseconds, None))?,
        Storage::Text => text_column(name, values),
    };
    Ok(converted)
}

fn text_column(name: PlSmallStr, values: &[CellValue]) -> PlColumn {
    PlColumn::new(
        name,
        values
            .iter()
            .map(CellValue::to_lossless_string)
            .collect::<Vec<_>>(),
    )
}

/// Convert a table to a `DataFrame`, keeping booleans, integers, floats and
/// timestamps typed. Decimals, text and JSON are stored as strings.
pub fn table_to_dataframe(table: &Table) -> Result<DataFrame, FrameError> {
    let columns = table
        .columns()
        .iter()
        .map(to_polars_column)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DataFrame::new(columns)?)
}

/// Convert a table to an all-string `DataFrame` for writing.
///
/// Decimals keep their exact digits, timestamps use ISO 8601 with a `Z`
/// suffix and structured values are compact JSON.
pub fn table_to_text_dataframe(table: &Table) -> Result<DataFrame, FrameError> {
    let columns = table
        .columns()
        .iter()
        .map(|column| text_column(column.name().into(), column.values()))
        .collect();
    Ok(DataFrame::new(columns)?)
}

pub fn dataframe_to_table(df: &DataFrame) -> Result<Table, FrameError> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| Ok(Column::new(column.name().as_str(), column_to_cells(column)?)))
        .collect::<Result<Vec<_>, FrameError>>()?;
    if columns.is_empty() {
        return Ok(Table::with_height(df.height()));
    }
    Ok(Table::new(columns)?)
}

fn timestamp(value: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    }
}

/// Cells of one polars column. Timestamps come back as UTC whatever their zone.
pub fn column_to_cells(column: &PlColumn) -> Result<Vec<CellValue>, FrameError> {
    if let PlDataType::Datetime(unit, _) = column.dtype() {
        let unit = *unit;
        let epochs = column.cast(&PlDataType::Int64)?;
        return Ok(epochs
            .i64()?
            .into_iter()
            .map(|v| v.and_then(|v| timestamp(v, unit)).map_or(CellValue::Null, CellValue::DateTime))
            .collect());
    }
    (0..column.len())
        .map(|idx| Ok(any_to_cell(column.get(idx)?)))
        .collect()
}

fn any_to_cell(value: AnyValue<'_>) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Null,
        AnyValue::Boolean(b) => CellValue::Bool(b),
        AnyValue::Int32(v) => CellValue::Int(i64::from(v)),
        AnyValue::Int64(v) => CellValue::Int(v),
        AnyValue::UInt32(v) => CellValue::Int(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Int),
        AnyValue::Float32(v) => CellValue::Float(f64::from(v)),
        AnyValue::Float64(v) => CellValue::Float(v),
        AnyValue::String(s) => CellValue::text(s),
        AnyValue::StringOwned(s) => CellValue::text(s.as_str()),
        other => CellValue::Text(other.to_string()),
    }
}
