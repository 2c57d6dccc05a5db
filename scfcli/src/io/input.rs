//! Configuration input: format detection, templating and parsing.

use crate::error::{Error, Result};
use clap::ValueEnum;
use handlebars::Handlebars;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Yaml,
    Json,
    Toml,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(InputFormat::Yaml),
            "json" => Ok(InputFormat::Json),
            "toml" => Ok(InputFormat::Toml),
            _ => Err(Error::UnsupportedExtension(path.display().to_string())),
        }
    }

    /// An explicit format wins; standard input defaults to YAML.
    pub fn resolve(path: Option<&Path>, explicit: Option<InputFormat>) -> Result<Self> {
        match (explicit, path) {
            (Some(format), _) => Ok(format),
            (None, Some(path)) => Self::from_path(path),
            (None, None) => Ok(InputFormat::Yaml),
        }
    }

    fn name(self) -> &'static str {
        match self {
            InputFormat::Yaml => "YAML",
            InputFormat::Json => "JSON",
            InputFormat::Toml => "TOML",
        }
    }
}

/// `key=value` from the command line.
pub fn parse_key_value(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::InvalidSubstitution(s.to_string())),
    }
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"))
}

/// Fills `{{ key }}` templates (strict, no escaping) and then plain
/// `{key}` placeholders. Unknown `{name}` placeholders are left alone, an
/// unknown `{{ name }}` is an error.
pub fn substitute(text: &str, keys: &[(String, String)]) -> Result<String> {
    let data: Map<String, Value> = keys
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    let rendered = registry
        .render_template(text, &data)
        .map_err(|e| Error::Template(e.to_string()))?;
    Ok(placeholder()
        .replace_all(&rendered, |caps: &Captures| match data.get(&caps[1]) {
            Some(Value::String(value)) => value.clone(),
            _ => caps[0].to_string(),
        })
        .into_owned())
}

/// Parses a whole document; the top level must be a mapping.
pub fn parse_document(text: &str, format: InputFormat) -> Result<Map<String, Value>> {
    let parse_error = |reason: String| Error::Parse {
        format: format.name(),
        reason,
    };
    let value: Value = match format {
        InputFormat::Yaml => serde_yml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
        InputFormat::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?,
        InputFormat::Toml => toml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
    };
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(parse_error(format!("expected a mapping of stages, got {}", other))),
    }
}

/// File contents, or standard input when `path` is `None` or `-`.
pub fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            info!("Reading configuration from: {}", path.display());
            Ok(fs::read_to_string(path)?)
        }
        _ => {
            info!("Reading configuration from standard input");
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Reads, substitutes (only when keys are given) and parses a document.
pub fn load_document(
    path: Option<&Path>,
    explicit: Option<InputFormat>,
    keys: &[(String, String)],
) -> Result<Map<String, Value>> {
    let stdin = path.map_or(true, |p| p == Path::new("-"));
    let format = InputFormat::resolve(if stdin { None } else { path }, explicit)?;
    let mut text = read_source(path)?;
    if !keys.is_empty() {
        text = substitute(&text, keys)?;
        debug!("configuration after substitution:\n{}", text);
    }
    parse_document(&text, format)
}
