//! Stage keys and their classification.

use crate::apply::RESERVED;
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;

/// Mean-field class names, canonical spelling.
pub const MEAN_FIELD_METHODS: [&str; 19] = [
    "HF", "RHF", "ROHF", "UHF", "DHF", "KS", "RKS", "ROKS", "UKS", "DFT", "KHF", "KRHF", "KROHF",
    "KUHF", "KKS", "KRKS", "KROKS", "KUKS", "KDFT",
];

/// Solvent models the solvent handler accepts.
pub const SOLVENT_MODELS: [&str; 2] = ["ddCOSMO", "ddPCM"];

const SOLVENT_FAMILY: [&str; 4] = ["ddCOSMO", "ddPCM", "PCM", "SMD"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemKind {
    Mole,
    Cell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageKind {
    Version,
    Import,
    System(SystemKind),
    /// Solvent model as written in the key.
    Solvent(String),
    Gradients,
    GeomOpt,
    /// Canonical upper-case class name.
    MeanField(String),
    MultiConfig,
    Expression,
    /// Class name as written in the key.
    PostMethod(String),
}

/// Drops the `-suffix` disambiguator.
pub fn base_key(key: &str) -> &str {
    key.split_once('-').map_or(key, |(base, _)| base)
}

/// Maps a stage key to its handler. The checks run in a fixed order:
/// structural names, mean-field classes, the `CAS` prefix, dotted
/// expressions and finally generic post-methods.
pub fn classify(key: &str) -> StageKind {
    let base = base_key(key);
    let lower = base.to_lowercase();
    match lower.as_str() {
        "version" => return StageKind::Version,
        "import" => return StageKind::Import,
        "mole" => return StageKind::System(SystemKind::Mole),
        "cell" => return StageKind::System(SystemKind::Cell),
        "gradients" => return StageKind::Gradients,
        "geomopt" => return StageKind::GeomOpt,
        _ => {}
    }
    if let Some(model) = SOLVENT_FAMILY
        .iter()
        .find(|m| m.eq_ignore_ascii_case(base))
    {
        return StageKind::Solvent(model.to_string());
    }
    if let Some(method) = MEAN_FIELD_METHODS
        .iter()
        .find(|m| m.eq_ignore_ascii_case(base))
    {
        return StageKind::MeanField(method.to_string());
    }
    if lower.starts_with("cas") {
        return StageKind::MultiConfig;
    }
    if base.contains('.') {
        return StageKind::Expression;
    }
    StageKind::PostMethod(base.to_string())
}

/// Multi-configuration class with its active space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McSpec {
    pub method: String,
    pub ncas: usize,
    pub nelecas: usize,
}

fn integers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

impl McSpec {
    /// `CASSCF(4,4)`: class name before the parenthesis, then exactly two
    /// integers, active orbitals first.
    pub fn parse(key: &str) -> Result<Self> {
        let base = base_key(key);
        let invalid = |reason: &str| Error::InvalidStageKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let (method, rest) = base
            .split_once('(')
            .ok_or_else(|| invalid("expected CASCI(n_orb, n_elec) or CASSCF(n_orb, n_elec)"))?;
        let numbers: Vec<usize> = integers()
            .find_iter(rest)
            .map(|m| m.as_str().parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| invalid("active space size does not fit"))?;
        match numbers.as_slice() {
            [ncas, nelecas] => Ok(McSpec {
                method: method.trim().to_string(),
                ncas: *ncas,
                nelecas: *nelecas,
            }),
            _ => Err(invalid("expected exactly two integers")),
        }
    }
}

impl fmt::Display for McSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.method, self.ncas, self.nelecas)
    }
}

/// One top-level entry of the configuration document.
#[derive(Debug, Clone, Copy)]
pub struct Stage<'a> {
    pub key: &'a str,
    pub body: &'a Value,
}

impl<'a> Stage<'a> {
    pub fn new(key: &'a str, body: &'a Value) -> Self {
        Stage { key, body }
    }

    pub fn base(&self) -> &'a str {
        base_key(self.key)
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidBody {
            stage: self.key.to_string(),
            reason: reason.into(),
        }
    }

    /// The body as a mapping; null counts as empty.
    pub fn mapping(&self) -> Result<Map<String, Value>> {
        match self.body {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map.clone()),
            other => Err(self.invalid(format!("expected a mapping, got {}", other))),
        }
    }

    /// Body entries without the reserved keys.
    pub fn attributes(&self) -> Result<Map<String, Value>> {
        Ok(self
            .mapping()?
            .into_iter()
            .filter(|(k, _)| !RESERVED.contains(&k.as_str()))
            .collect())
    }

    /// Positional arguments; a scalar counts as one argument.
    pub fn args(&self) -> Result<Vec<Value>> {
        Ok(match self.mapping()?.remove("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
        })
    }

    pub fn kwargs(&self) -> Result<Map<String, Value>> {
        match self.mapping()?.remove("kwargs") {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(self.invalid(format!("kwargs must be a mapping, got {}", other))),
        }
    }

    /// Requested result paths; a single string becomes a one-element list.
    pub fn results(&self) -> Result<Vec<String>> {
        let Value::Object(map) = self.body else {
            return Ok(Vec::new());
        };
        match map.get("results") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(path)) => Ok(vec![path.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(path) => Ok(path.clone()),
                    other => Err(self.invalid(format!("result paths must be strings, got {}", other))),
                })
                .collect(),
            Some(other) => Err(self.invalid(format!("results must be a string or a list, got {}", other))),
        }
    }

    /// Attributes, positional and keyword arguments of an expression
    /// stage. A bare scalar or list body gives the positional arguments.
    pub fn invocation(&self) -> Result<(Map<String, Value>, Vec<Value>, Map<String, Value>)> {
        match self.body {
            Value::Null | Value::Object(_) => Ok((self.attributes()?, self.args()?, self.kwargs()?)),
            Value::Array(items) => Ok((Map::new(), items.clone(), Map::new())),
            scalar => Ok((Map::new(), vec![scalar.clone()], Map::new())),
        }
    }

    /// Module names of an import stage.
    pub fn modules(&self) -> Result<Vec<String>> {
        match self.body {
            Value::String(name) => Ok(vec![name.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid("module names must be strings"))
                })
                .collect(),
            other => Err(self.invalid(format!("expected a module name or a list, got {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structural_names_are_case_insensitive() {
        assert_eq!(classify("MOLE"), StageKind::System(SystemKind::Mole));
        assert_eq!(classify("Cell"), StageKind::System(SystemKind::Cell));
        assert_eq!(classify("geomopt"), StageKind::GeomOpt);
        assert_eq!(classify("GEOMOPT-2"), StageKind::GeomOpt);
        assert_eq!(classify("Gradients"), StageKind::Gradients);
        assert_eq!(classify("version"), StageKind::Version);
        assert_eq!(classify("import"), StageKind::Import);
    }

    #[test]
    fn test_suffix_is_stripped_at_first_dash() {
        assert_eq!(base_key("HF-1"), "HF");
        assert_eq!(base_key("MP2-a-b"), "MP2");
        assert_eq!(base_key("CCSD"), "CCSD");
        assert_eq!(classify("uhf-second"), StageKind::MeanField("UHF".to_string()));
    }

    #[test]
    fn test_precedence() {
        // CAS prefix wins over the generic branch
        assert_eq!(classify("CASSCF"), StageKind::MultiConfig);
        assert_eq!(classify("casci(2,2)"), StageKind::MultiConfig);
        assert_eq!(classify("pyscf.lib.num_threads"), StageKind::Expression);
        assert_eq!(classify("MP2"), StageKind::PostMethod("MP2".to_string()));
        assert_eq!(classify("KRKS"), StageKind::MeanField("KRKS".to_string()));
        assert_eq!(classify("ddcosmo"), StageKind::Solvent("ddCOSMO".to_string()));
        assert_eq!(classify("SMD"), StageKind::Solvent("SMD".to_string()));
    }

    #[test]
    fn test_mc_spec() {
        let spec = McSpec::parse("CASSCF(4,6)").unwrap();
        assert_eq!(spec.method, "CASSCF");
        assert_eq!((spec.ncas, spec.nelecas), (4, 6));
        let spec = McSpec::parse("CASCI( 2 , 2 )-x").unwrap();
        assert_eq!((spec.ncas, spec.nelecas), (2, 2));
        assert!(McSpec::parse("CASSCF").is_err());
        assert!(McSpec::parse("CASSCF(4)").is_err());
        assert!(McSpec::parse("CASSCF(4,4,4)").is_err());
    }

    #[test]
    fn test_body_accessors() {
        let body = json!({"conv_tol": 1e-9, "args": 4, "kwargs": {"x": 1}, "results": "e_tot"});
        let stage = Stage::new("HF", &body);
        assert_eq!(stage.attributes().unwrap().len(), 1);
        assert_eq!(stage.args().unwrap(), vec![json!(4)]);
        assert_eq!(stage.kwargs().unwrap()["x"], json!(1));
        assert_eq!(stage.results().unwrap(), vec!["e_tot".to_string()]);

        let null = Value::Null;
        let stage = Stage::new("HF", &null);
        assert!(stage.attributes().unwrap().is_empty());
        assert!(stage.results().unwrap().is_empty());

        let list = json!(["pyscf.mcscf", "numpy"]);
        assert_eq!(Stage::new("import", &list).modules().unwrap().len(), 2);
        let scalar = json!(3);
        assert!(Stage::new("HF", &scalar).mapping().is_err());
    }
}
