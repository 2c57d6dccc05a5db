//! Run configuration assembled from the command line.

mod args;

pub use args::Args;

use crate::io::{InputFormat, OutputFormat};
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Execute,
    /// Print source statements only.
    Emit,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// `None` reads standard input.
    pub source: Option<PathBuf>,
    pub input_format: Option<InputFormat>,
    pub keys: Vec<(String, String)>,
    pub output: OutputFormat,
    pub mode: ExecutionMode,
    pub log_file: Option<PathBuf>,
    pub log_level: Level,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            source: None,
            input_format: None,
            keys: Vec::new(),
            output: OutputFormat::Yaml,
            mode: ExecutionMode::Execute,
            log_file: None,
            log_level: Level::INFO,
        }
    }
}

/// INFO by default, each -v one step more verbose, each -q one step less.
pub fn log_level(verbose: u8, quiet: u8) -> Level {
    match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-2 => Level::ERROR,
        -1 => Level::WARN,
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        RunConfig {
            source: args.config.or(args.config_file),
            input_format: args.input_format,
            keys: args.keys,
            output: args.output,
            mode: if args.dry_run {
                ExecutionMode::Emit
            } else {
                ExecutionMode::Execute
            },
            log_file: args.log_file,
            log_level: log_level(args.verbose, args.quiet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, 0), Level::INFO);
        assert_eq!(log_level(2, 0), Level::TRACE);
        assert_eq!(log_level(5, 0), Level::TRACE);
        assert_eq!(log_level(0, 1), Level::WARN);
        assert_eq!(log_level(0, 3), Level::ERROR);
    }

    #[test]
    fn test_args_to_run_config() {
        let args = Args::try_parse_from([
            "scfcli", "job.yaml", "-o", "json", "-k", "basis=sto-3g", "-k", "n=2", "--dry-run", "-vv",
        ])
        .unwrap();
        let config = RunConfig::from(args);
        assert_eq!(config.source, Some(PathBuf::from("job.yaml")));
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.keys.len(), 2);
        assert_eq!(config.keys[1], ("n".to_string(), "2".to_string()));
        assert_eq!(config.mode, ExecutionMode::Emit);
        assert_eq!(config.log_level, Level::TRACE);
    }

    #[test]
    fn test_cli_defaults_and_errors() {
        let config = RunConfig::from(Args::try_parse_from(["scfcli", "-o", "QCSchema"]).unwrap());
        assert_eq!(config.source, None);
        assert_eq!(config.output, OutputFormat::QcSchema);
        assert_eq!(config.mode, ExecutionMode::Execute);
        assert!(Args::try_parse_from(["scfcli", "-k", "oops"]).is_err());
        assert!(Args::try_parse_from(["scfcli", "-v", "-q"]).is_err());
        assert!(Args::try_parse_from(["scfcli", "a.yaml", "-c", "b.yaml"]).is_err());
    }
}
