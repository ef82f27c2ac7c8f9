//! Terminal rendering of validation results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use focus_model::{Severity, ValidationFinding, ValidationReport};
use focus_standards::MappingLint;
use focus_validate::SAMPLE_LIMIT;

pub fn print_report_summary(report: &ValidationReport) {
    println!(
        "FOCUS {}: {} errors, {} warnings",
        report.spec_version,
        report.error_count(),
        report.warning_count()
    );
    if report.findings.is_empty() {
        return;
    }
    let mut findings: Vec<&ValidationFinding> = report.findings.iter().collect();
    // Stable: keeps check order within a severity.
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Check"),
        header_cell("Column"),
        header_cell("Rows"),
        header_cell("Message"),
        header_cell("Examples"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for finding in findings {
        table.add_row(vec![
            severity_cell(finding.severity),
            Cell::new(&finding.check_id),
            optional_cell(finding.column.as_deref()),
            finding
                .failing_rows
                .map_or_else(|| dim_cell("-"), |n| Cell::new(n).fg(severity_color(finding.severity))),
            Cell::new(&finding.message),
            example_cell(finding.sample_values.as_deref()),
        ]);
    }
    println!("{table}");
}

pub fn print_lint(lint: &MappingLint) {
    for error in &lint.errors {
        println!("ERROR {error}");
    }
    for warning in &lint.warnings {
        println!("WARN  {warning}");
    }
    if lint.is_valid() {
        println!("Mapping OK ({} warnings)", lint.warnings.len());
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    let cell = Cell::new(severity.as_str()).fg(severity_color(severity));
    if severity == Severity::Error {
        cell.add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::DarkGrey,
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn optional_cell(value: Option<&str>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn example_cell(samples: Option<&[String]>) -> Cell {
    match samples {
        Some(values) if !values.is_empty() => {
            let mut text = values.join(", ");
            if values.len() == SAMPLE_LIMIT {
                text.push_str(", ...");
            }
            Cell::new(text)
        }
        _ => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
