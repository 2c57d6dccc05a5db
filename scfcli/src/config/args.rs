//! Command-line argument parsing

use crate::io::{parse_key_value, InputFormat, OutputFormat};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Run staged quantum-chemistry workflows described in YAML, JSON or TOML
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file; read from standard input when omitted or `-`
    pub config_file: Option<PathBuf>,

    /// Configuration file (same as the positional argument)
    #[arg(short, long, conflicts_with = "config_file")]
    pub config: Option<PathBuf>,

    /// Result format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,

    /// Template substitution, may be repeated: -k name=value
    #[arg(short = 'k', long = "key", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub keys: Vec<(String, String)>,

    /// Print equivalent source statements instead of running
    #[arg(long)]
    pub dry_run: bool,

    /// Input format, required to parse standard input as anything but YAML
    #[arg(long, value_enum)]
    pub input_format: Option<InputFormat>,

    /// Write logs to this file instead of standard error
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// More log output (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (repeat for less)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,
}
