//! CSV input and output for FOCUS tables.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use focus_model::Table;
use focus_transform::{dataframe_to_table, table_to_text_dataframe};
use polars::prelude::{CsvReadOptions, CsvWriter, SerReader, SerWriter};
use tracing::debug;

/// Read a CSV file with every column as text. Empty fields become null.
pub fn read_csv_table(path: &Path) -> Result<Table> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to read CSV: {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read csv");
    dataframe_to_table(&df).with_context(|| format!("convert {}", path.display()))
}

/// Write `table` as CSV, creating parent directories as needed.
///
/// Decimals keep their exact digits, date-times are ISO-8601 UTC with `Z`,
/// structured values are compact JSON.
pub fn write_csv_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut df = table_to_text_dataframe(table).context("render output table")?;
    let mut file =
        File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("write CSV: {}", path.display()))?;
    debug!(path = %path.display(), rows = table.height(), "wrote csv");
    Ok(())
}
