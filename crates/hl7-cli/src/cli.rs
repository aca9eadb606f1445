//! CLI argument definitions for the HL7 transformer.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use hl7_map::MappingFormat;

#[derive(Parser)]
#[command(
    name = "hl7-transform",
    version,
    about = "Apply field mappings to HL7 v2 messages",
    long_about = "Apply field mappings to HL7 v2 messages.\n\n\
                  A mapping lists target fields and the operation computing each value.\n\
                  Mappings are read from JSON or CSV files; messages are read and\n\
                  written as ER7 text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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

    /// Allow field values in log output.
    ///
    /// Messages carry patient data, so values are redacted unless this is set.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a mapping to a message and print the result.
    Transform(TransformArgs),

    /// List the available mapping operations.
    Operations,

    /// Print field values of a message.
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct TransformArgs {
    /// Mapping file (JSON or CSV).
    #[arg(value_name = "MAPPING")]
    pub mapping: PathBuf,

    /// Message to transform. Without it an empty message is built.
    #[arg(short = 'm', long = "message", value_name = "PATH")]
    pub message: Option<PathBuf>,

    /// Mapping file type (default: from the file extension, else json).
    #[arg(short = 't', long = "type", value_enum)]
    pub mapping_type: Option<MappingTypeArg>,

    /// Write the transformed message here instead of stdout.
    #[arg(short = 'o', long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Message file in ER7 format.
    #[arg(value_name = "MESSAGE")]
    pub message: PathBuf,

    /// Field paths to print, e.g. PID.5.1. Without any, lists the segments.
    #[arg(value_name = "FIELD")]
    pub fields: Vec<String>,
}

/// CLI mapping type choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum MappingTypeArg {
    Json,
    Csv,
}

impl From<MappingTypeArg> for MappingFormat {
    fn from(value: MappingTypeArg) -> Self {
        match value {
            MappingTypeArg::Json => Self::Json,
            MappingTypeArg::Csv => Self::Csv,
        }
    }
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
