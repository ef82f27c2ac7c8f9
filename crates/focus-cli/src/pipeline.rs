//! Command workflows shared by the binary and its tests.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use focus_model::{FocusSpec, MappingConfig, ValidationReport};
use focus_standards::{MappingLint, load_focus_spec, load_mapping_config, validate_mapping};
use focus_transform::{check_expression, generate_focus_table};
use focus_validate::{validate_focus_table, write_validation_report};
use tracing::info;

/// Inputs of the `generate` command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub input: PathBuf,
    pub mapping: PathBuf,
    pub output: PathBuf,
    /// Spec version to load; defaults to the mapping's `spec_version`.
    pub spec_version: Option<String>,
    pub spec_dir: Option<PathBuf>,
    /// Report path; defaults to `<output>.validation.json`.
    pub validation_out: Option<PathBuf>,
    pub skip_validation: bool,
}

#[derive(Debug)]
pub struct GenerateOutcome {
    pub output: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub report: Option<ValidationReport>,
    pub report_path: Option<PathBuf>,
}

impl GenerateOutcome {
    pub fn has_errors(&self) -> bool {
        self.report.as_ref().is_some_and(ValidationReport::has_errors)
    }
}

/// Inputs of the `validate` command.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub input: PathBuf,
    pub spec_version: String,
    pub spec_dir: Option<PathBuf>,
    /// Mapping whose validation defaults and overrides apply.
    pub mapping: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

/// `<output>.validation.json` next to the output file.
pub fn default_report_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_else(|| "focus".into());
    name.push(".validation.json");
    output.with_file_name(name)
}

fn load_mapping(path: &Path) -> Result<MappingConfig> {
    load_mapping_config(path).with_context(|| format!("load mapping {}", path.display()))
}

fn load_spec(version: &str, spec_dir: Option<&Path>) -> Result<FocusSpec> {
    load_focus_spec(version, spec_dir).with_context(|| format!("load FOCUS spec {version}"))
}

pub fn run_generate(options: &GenerateOptions) -> Result<GenerateOutcome> {
    let mapping = load_mapping(&options.mapping)?;
    let version = options
        .spec_version
        .clone()
        .unwrap_or_else(|| mapping.spec_version.clone());
    let spec = load_spec(&version, options.spec_dir.as_deref())?;
    let source = crate::io::read_csv_table(&options.input)?;

    let output = generate_focus_table(&source, &mapping, &spec).context("generate FOCUS table")?;
    info!(rows = output.height(), columns = output.width(), "generation complete");
    crate::io::write_csv_table(&output, &options.output)?;

    let (report, report_path) = if options.skip_validation {
        (None, None)
    } else {
        let report = validate_focus_table(&output, &spec, Some(&mapping));
        let path = options
            .validation_out
            .clone()
            .unwrap_or_else(|| default_report_path(&options.output));
        write_validation_report(&report, &path)?;
        (Some(report), Some(path))
    };

    Ok(GenerateOutcome {
        output: options.output.clone(),
        rows: output.height(),
        columns: output.width(),
        report,
        report_path,
    })
}

pub fn run_validate(options: &ValidateOptions) -> Result<ValidationReport> {
    let spec = load_spec(&options.spec_version, options.spec_dir.as_deref())?;
    let mapping = options.mapping.as_deref().map(load_mapping).transpose()?;
    let table = crate::io::read_csv_table(&options.input)?;
    let report = validate_focus_table(&table, &spec, mapping.as_ref());
    if let Some(path) = &options.out {
        write_validation_report(&report, path)?;
    }
    Ok(report)
}

/// Lint a mapping against its spec version (or an explicit one).
pub fn run_check_mapping(
    mapping_path: &Path,
    spec_version: Option<&str>,
    spec_dir: Option<&Path>,
) -> Result<MappingLint> {
    let mapping = load_mapping(mapping_path)?;
    let version = spec_version.unwrap_or(&mapping.spec_version);
    let spec = load_spec(version, spec_dir)?;
    Ok(validate_mapping(&mapping, &spec, check_expression))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_path_sits_next_to_output() {
        assert_eq!(
            default_report_path(Path::new("out/focus.csv")),
            PathBuf::from("out/focus.csv.validation.json")
        );
    }
}
