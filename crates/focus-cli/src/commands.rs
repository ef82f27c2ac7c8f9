//! Subcommand handlers. Each returns the process exit code.

use std::io::{self, Write};

use anyhow::{Context, Result};
use focus_cli::pipeline::{
    GenerateOptions, ValidateOptions, run_check_mapping, run_generate, run_validate,
};
use focus_model::ValidationReport;
use focus_standards::list_available_spec_versions;
use focus_validate::report_to_json;

use crate::cli::{CheckMappingArgs, GenerateArgs, SpecDirArgs, ValidateArgs};
use crate::summary::{print_lint, print_report_summary};

pub fn run_generate_command(args: GenerateArgs) -> Result<i32> {
    let options = GenerateOptions {
        input: args.input,
        mapping: args.mapping,
        output: args.output,
        spec_version: args.spec,
        spec_dir: args.spec_dir.spec_dir,
        validation_out: args.validation_out,
        skip_validation: args.no_validate,
    };
    let outcome = run_generate(&options)?;
    println!(
        "Wrote {} rows x {} columns to {}",
        outcome.rows,
        outcome.columns,
        outcome.output.display()
    );
    if let Some(path) = &outcome.report_path {
        println!("Validation report: {}", path.display());
    }
    if let Some(report) = &outcome.report {
        print_report_summary(report);
    }
    Ok(i32::from(outcome.has_errors()))
}

pub fn run_validate_command(args: ValidateArgs) -> Result<i32> {
    let print_json = args.out.is_none();
    let options = ValidateOptions {
        input: args.input,
        spec_version: args.spec,
        spec_dir: args.spec_dir.spec_dir,
        mapping: args.mapping,
        out: args.out,
    };
    let report = run_validate(&options)?;
    if print_json {
        print_report_json(&mut io::stdout().lock(), &report)?;
    } else {
        print_report_summary(&report);
    }
    Ok(i32::from(report.has_errors()))
}

fn print_report_json(out: &mut impl Write, report: &ValidationReport) -> Result<()> {
    let json = report_to_json(report).context("serialize validation report")?;
    writeln!(out, "{json}").context("write validation report")
}

pub fn run_check_mapping_command(args: &CheckMappingArgs) -> Result<i32> {
    let lint = run_check_mapping(
        &args.mapping,
        args.spec.as_deref(),
        args.spec_dir.spec_dir.as_deref(),
    )?;
    print_lint(&lint);
    Ok(i32::from(!lint.is_valid()))
}

pub fn run_versions_command(args: &SpecDirArgs) -> Result<i32> {
    let versions = list_available_spec_versions(args.spec_dir.as_deref())
        .context("list spec versions")?;
    if versions.is_empty() {
        eprintln!("no FOCUS spec documents found");
        return Ok(1);
    }
    for version in versions {
        println!("{version}");
    }
    Ok(0)
}
