//! Bridge to an embedded SQL engine for `sql` steps.

use focus_model::{CellValue, Table, is_read_only_query};
use polars::prelude::IntoLazy;
use polars::sql::SQLContext;
use thiserror::Error;
use tracing::debug;

use crate::frame::{column_to_cells, table_to_dataframe};

/// Name the source table is registered under.
pub const SOURCE_RELATION: &str = "src";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query must start with SELECT or WITH")]
    NotReadOnly,

    #[error("query returned no columns")]
    NoColumns,

    #[error("{0}")]
    Engine(String),
}

/// What an `sql` step asks the engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRequest<'a> {
    /// A column expression, evaluated once per source row.
    Expression(&'a str),
    /// A complete read-only query; its first column is used.
    Query(&'a str),
}

impl QueryRequest<'_> {
    pub fn to_sql(&self) -> Result<String, QueryError> {
        match self {
            QueryRequest::Expression(expr) => {
                Ok(format!("SELECT {expr} AS result FROM {SOURCE_RELATION}"))
            }
            QueryRequest::Query(query) if is_read_only_query(query) => Ok((*query).to_string()),
            QueryRequest::Query(_) => Err(QueryError::NotReadOnly),
        }
    }
}

/// An analytical engine that can answer a [`QueryRequest`] over one table.
pub trait QueryEngine {
    /// Run `request` with `source` registered as [`SOURCE_RELATION`] and return
    /// the first result column.
    fn run(&self, source: &Table, request: &QueryRequest<'_>) -> Result<Vec<CellValue>, QueryError>;
}

/// [`QueryEngine`] backed by the polars SQL context.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolarsSqlEngine;

impl PolarsSqlEngine {
    pub fn new() -> Self {
        Self
    }
}

fn engine_error(err: impl std::fmt::Display) -> QueryError {
    QueryError::Engine(err.to_string())
}

impl QueryEngine for PolarsSqlEngine {
    fn run(&self, source: &Table, request: &QueryRequest<'_>) -> Result<Vec<CellValue>, QueryError> {
        let sql = request.to_sql()?;
        debug!(%sql, "running sql step");
        let df = table_to_dataframe(source).map_err(engine_error)?;
        let mut ctx = SQLContext::new();
        ctx.register(SOURCE_RELATION, df.lazy());
        let result = ctx
            .execute(&sql)
            .and_then(|lazy| lazy.collect())
            .map_err(engine_error)?;
        let column = result.get_columns().first().ok_or(QueryError::NoColumns)?;
        column_to_cells(column).map_err(engine_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use focus_model::Column;

    fn source() -> Table {
        Table::new(vec![
            Column::new("cost", vec![CellValue::Int(10), CellValue::Int(20), CellValue::Null]),
            Column::from_text("svc", [Some("ec2"), Some("s3"), Some("rds")]),
        ])
        .unwrap()
    }

    #[test]
    fn expression_is_wrapped_in_select() {
        assert_eq!(
            QueryRequest::Expression("cost * 2").to_sql().unwrap(),
            "SELECT cost * 2 AS result FROM src"
        );
    }

    #[test]
    fn only_read_only_queries_are_accepted() {
        assert!(QueryRequest::Query("  with t as (select 1) select * from t").to_sql().is_ok());
        assert_eq!(
            QueryRequest::Query("DROP TABLE src").to_sql(),
            Err(QueryError::NotReadOnly)
        );
        assert_eq!(
            QueryRequest::Query("DELETE FROM src").to_sql(),
            Err(QueryError::NotReadOnly)
        );
    }

    #[test]
    fn polars_engine_evaluates_expressions() {
        let out = PolarsSqlEngine::new()
            .run(&source(), &QueryRequest::Expression("cost * 2"))
            .unwrap();
        assert_eq!(out, vec![CellValue::Int(20), CellValue::Int(40), CellValue::Null]);

        let upper = PolarsSqlEngine::new()
            .run(&source(), &QueryRequest::Query("SELECT UPPER(svc) AS s FROM src"))
            .unwrap();
        assert_eq!(upper[0], CellValue::text("EC2"));
    }

    #[test]
    fn datetime_results_are_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let table = Table::new(vec![Column::new("at", vec![CellValue::DateTime(ts)])]).unwrap();
        let out = PolarsSqlEngine::new()
            .run(&table, &QueryRequest::Expression("at"))
            .unwrap();
        assert_eq!(out, vec![CellValue::DateTime(ts)]);
    }

    #[test]
    fn engine_errors_are_reported() {
        let err = PolarsSqlEngine::new()
            .run(&source(), &QueryRequest::Expression("no_such_column + 1"))
            .unwrap_err();
        assert!(matches!(err, QueryError::Engine(_)));
    }
}
