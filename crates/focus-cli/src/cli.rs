//! CLI argument definitions for focus-mapper.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "focus-mapper",
    version,
    about = "Map billing exports to FinOps FOCUS datasets",
    long_about = "Map cloud billing exports to FinOps FOCUS datasets.\n\n\
                  Columns are produced by declarative YAML mappings and the result\n\
                  is validated against a versioned FOCUS column spec."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a FOCUS dataset from a source CSV and a mapping.
    Generate(GenerateArgs),

    /// Validate an existing FOCUS dataset.
    Validate(ValidateArgs),

    /// Check a mapping file without reading any data.
    CheckMapping(CheckMappingArgs),

    /// List the available FOCUS spec versions.
    Versions(SpecDirArgs),
}

#[derive(Args)]
pub struct SpecDirArgs {
    /// Directory containing spec JSON files (also read from FOCUS_SPEC_DIR).
    #[arg(long = "spec-dir", value_name = "DIR")]
    pub spec_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Source billing CSV.
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Mapping YAML.
    #[arg(long, value_name = "YAML")]
    pub mapping: PathBuf,

    /// Output CSV.
    #[arg(long, value_name = "CSV")]
    pub output: PathBuf,

    /// FOCUS spec version (default: the mapping's spec_version).
    #[arg(long = "spec", value_name = "VERSION")]
    pub spec: Option<String>,

    #[command(flatten)]
    pub spec_dir: SpecDirArgs,

    /// Validation report path (default: <OUTPUT>.validation.json).
    #[arg(long = "validation-out", value_name = "PATH")]
    pub validation_out: Option<PathBuf>,

    /// Skip validation of the generated dataset.
    #[arg(long = "no-validate", conflicts_with = "validation_out")]
    pub no_validate: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// FOCUS dataset CSV.
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// FOCUS spec version.
    #[arg(long = "spec", value_name = "VERSION", default_value = "v1.2")]
    pub spec: String,

    #[command(flatten)]
    pub spec_dir: SpecDirArgs,

    /// Mapping YAML whose validation settings apply.
    #[arg(long, value_name = "YAML")]
    pub mapping: Option<PathBuf>,

    /// Write the JSON report here instead of printing it.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckMappingArgs {
    /// Mapping YAML.
    #[arg(value_name = "YAML")]
    pub mapping: PathBuf,

    /// FOCUS spec version (default: the mapping's spec_version).
    #[arg(long = "spec", value_name = "VERSION")]
    pub spec: Option<String>,

    #[command(flatten)]
    pub spec_dir: SpecDirArgs,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
