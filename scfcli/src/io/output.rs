//! Result rendering and logging setup.

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime as StdSystemTime;
use tracing::{info, warn, Level};
use tracing_subscriber::{
    filter::LevelFilter, fmt::format::Writer, fmt::layer, fmt::time::FormatTime,
    layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    /// Accepted, rendered as JSON for now.
    #[value(name = "QCSchema", alias = "qcschema")]
    QcSchema,
}

fn to_json(results: &Map<String, Value>) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    results
        .serialize(&mut serializer)
        .map_err(|e| Error::Serialize {
            format: "JSON",
            reason: e.to_string(),
        })?;
    String::from_utf8(buf).map_err(|e| Error::Serialize {
        format: "JSON",
        reason: e.to_string(),
    })
}

/// Serialises the stage -> results mapping.
pub fn render(results: &Map<String, Value>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yml::to_string(results).map_err(|e| Error::Serialize {
            format: "YAML",
            reason: e.to_string(),
        }),
        OutputFormat::Json => to_json(results),
        OutputFormat::QcSchema => {
            warn!("QCSchema output is not implemented, writing JSON instead");
            to_json(results)
        }
    }
}

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = StdSystemTime::now();
        let duration = now
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Logs go to `log_file` when given and to standard error otherwise, so
/// that standard output only carries results or emitted source.
pub fn setup_logging(log_file: Option<&Path>, level: Level) -> Result<()> {
    let filter = LevelFilter::from_level(level);
    let installed = match log_file {
        Some(path) => {
            let log = File::create(path)?;
            let file_layer = layer()
                .with_writer(Mutex::new(log))
                .with_timer(SecondPrecisionTimer)
                .with_ansi(false)
                .with_filter(filter);
            Registry::default().with(file_layer).try_init()
        }
        None => {
            let stderr_layer = layer()
                .with_writer(std::io::stderr)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true)
                .with_filter(filter);
            Registry::default().with(stderr_layer).try_init()
        }
    };
    installed.map_err(|e| Error::Logging(e.to_string()))?;
    if let Some(path) = log_file {
        info!("Log will be written to: {}", path.display());
    }
    Ok(())
}
