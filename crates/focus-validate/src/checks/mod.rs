//! Validation check modules.
//!
//! Each module performs one kind of check. They all read the same table and
//! never see each other's findings.

mod allowed;
mod currency;
mod datetime;
mod decimal;
mod nullable;
mod presence;
mod string;
mod structured;
mod unknown;

use focus_model::{
    Column, ColumnSpec, DataType, FocusSpec, MappingConfig, Table, ValidationFinding,
    ValidationSettings,
};
use tracing::debug;

use crate::settings::effective_settings;

/// Inputs shared by every check.
pub struct CheckContext<'a> {
    pub table: &'a Table,
    pub spec: &'a FocusSpec,
    pub mapping: Option<&'a MappingConfig>,
}

impl<'a> CheckContext<'a> {
    pub fn settings(&self, column: &str) -> ValidationSettings {
        effective_settings(self.mapping, column)
    }

    /// Spec columns that are present in the table, in spec order.
    pub fn present_columns(&self) -> impl Iterator<Item = (&'a ColumnSpec, &'a Column)> + use<'a> {
        let (table, spec) = (self.table, self.spec);
        spec.columns
            .iter()
            .filter_map(move |col| table.column(&col.name).map(|column| (col, column)))
    }
}

type Check = fn(&CheckContext<'_>) -> Vec<ValidationFinding>;

/// Run all checks in their fixed order.
pub fn run_all(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let checks: [(&str, Check); 6] = [
        ("presence", presence::check),
        ("nullable", nullable::check),
        ("allowed_values", allowed::check),
        ("types", check_types),
        ("unknown_columns", unknown::check),
        ("currency", currency::check),
    ];

    let mut findings = Vec::new();
    for (name, check) in checks {
        let found = check(ctx);
        debug!(check = name, findings = found.len(), "validation check finished");
        findings.extend(found);
    }
    findings
}

/// Type-specific structural checks, driven by the declared data type.
fn check_types(ctx: &CheckContext<'_>) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    for (spec, column) in ctx.present_columns() {
        let settings = ctx.settings(&spec.name);
        match spec.data_type {
            DataType::DateTime => findings.extend(datetime::check(column, &settings)),
            DataType::Decimal => findings.extend(decimal::check(spec, column, &settings)),
            DataType::String => findings.extend(string::check(column, &settings)),
            DataType::Structured => findings.extend(structured::check(column, &settings)),
        }
    }
    findings
}
