use crate::config::{Args, ExecutionMode, RunConfig};
use crate::io::{load_document, render, setup_logging};
use crate::{emit, execute};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::io::Write;
use tracing::info;

pub struct CliApplication {
    config: RunConfig,
}

impl CliApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        Ok(Self {
            config: RunConfig::from(args),
        })
    }

    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn run(self) -> Result<()> {
        let config = self.config;
        setup_logging(config.log_file.as_deref(), config.log_level)
            .wrap_err("Unable to set up logging")?;

        let source = config
            .source
            .as_ref()
            .map_or_else(|| "standard input".to_string(), |p| p.display().to_string());
        let mut document = load_document(config.source.as_deref(), config.input_format, &config.keys)
            .wrap_err_with(|| format!("Unable to load configuration from {}", source))?;
        info!("{} stages in configuration", document.len());

        let stdout = std::io::stdout();
        match config.mode {
            ExecutionMode::Emit => {
                emit(&mut document, stdout.lock()).wrap_err("Dry run failed")?;
            }
            ExecutionMode::Execute => {
                let results = execute(&mut document).wrap_err("Calculation failed")?;
                let text = render(&results, config.output)?;
                let mut out = stdout.lock();
                write!(out, "{}", text)?;
                if !text.ends_with('\n') {
                    writeln!(out)?;
                }
            }
        }
        Ok(())
    }
}
