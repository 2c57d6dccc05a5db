//! Runs a configuration document stage by stage.

use crate::backend::{Backend, ContextKind, Contextual};
use crate::error::{Error, Result};
use crate::path::Path;
use crate::stage::{classify, McSpec, Stage, StageKind, SOLVENT_MODELS};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// One pass over a document. The context produced by each stage is the
/// input of the next one.
pub struct Task<B: Backend> {
    backend: B,
    context: Option<B::Context>,
    results: Map<String, Value>,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl<B: Backend> Task<B> {
    pub fn new(backend: B) -> Self {
        Task {
            backend,
            context: None,
            results: Map::new(),
        }
    }

    /// Processes every stage in document order. Requested results are
    /// written back into the stage bodies and collected per stage key.
    pub fn run(&mut self, document: &mut Map<String, Value>) -> Result<()> {
        self.backend.begin()?;
        let keys: Vec<String> = document.keys().cloned().collect();
        for key in keys {
            let body = document.get(&key).cloned().unwrap_or(Value::Null);
            let stage = Stage::new(&key, &body);
            if let Some(values) = self.run_stage(&stage)? {
                if let Some(Value::Object(map)) = document.get_mut(&key) {
                    map.insert("results".to_string(), Value::Object(values.clone()));
                }
                self.results.insert(key.clone(), Value::Object(values));
            }
        }
        Ok(())
    }

    pub fn results(&self) -> &Map<String, Value> {
        &self.results
    }

    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }

    pub fn into_results(self) -> Map<String, Value> {
        self.results
    }

    fn inapplicable(stage: &Stage, context: Option<&B::Context>) -> Error {
        Error::InapplicableContext {
            stage: stage.key.to_string(),
            context: context.map_or_else(|| "an empty context".to_string(), |c| c.kind().to_string()),
        }
    }

    fn require<F>(stage: &Stage, context: Option<B::Context>, accepts: F) -> Result<B::Context>
    where
        F: Fn(ContextKind) -> bool,
    {
        match context {
            Some(c) if accepts(c.kind()) => Ok(c),
            other => Err(Self::inapplicable(stage, other.as_ref())),
        }
    }

    fn run_stage(&mut self, stage: &Stage) -> Result<Option<Map<String, Value>>> {
        let kind = classify(stage.key);
        info!("stage `{}`", stage.key);
        debug!("classified as {:?}", kind);
        let context = self.context.take();

        let paths = match kind {
            StageKind::Version | StageKind::Import | StageKind::Expression => Vec::new(),
            _ => stage
                .results()?
                .iter()
                .map(|p| Path::parse(p))
                .collect::<Result<Vec<_>>>()?,
        };

        let context = match &kind {
            StageKind::Version => {
                debug!("configuration version {}", stage.body);
                self.context = context;
                return Ok(None);
            }
            StageKind::Import => {
                self.backend.import(stage, &stage.modules()?)?;
                self.context = context;
                return Ok(None);
            }
            StageKind::Expression => {
                let path = Path::parse(stage.base())?;
                let value = self.backend.expression(stage, &path)?;
                self.context = Some(context.unwrap_or_else(|| self.backend.namespace()));
                if let Some(value) = value {
                    self.results.insert(stage.key.to_string(), value);
                }
                return Ok(None);
            }
            StageKind::System(system) => {
                let context = context.filter(|c| c.kind() != ContextKind::Namespace);
                self.backend.system(stage, *system, context)?
            }
            StageKind::MeanField(method) => {
                let context = Self::require(stage, context, |k| k != ContextKind::Namespace)?;
                self.backend.mean_field(stage, method, context)?
            }
            StageKind::Solvent(model) => {
                if !SOLVENT_MODELS.contains(&model.as_str()) {
                    return Err(Error::InvalidSolventModel(stage.base().to_string()));
                }
                match context {
                    Some(c) if c.kind() == ContextKind::MeanField => {
                        self.backend.solvent(stage, model, c)?
                    }
                    other => {
                        return Err(Error::SolventTarget(
                            other.map_or_else(|| "an empty context".to_string(), |c| c.kind().to_string()),
                        ))
                    }
                }
            }
            StageKind::MultiConfig => {
                let spec = McSpec::parse(stage.key)?;
                let context = Self::require(stage, context, ContextKind::has_reference)?;
                self.backend.multi_config(stage, &spec, context)?
            }
            StageKind::PostMethod(name) => {
                if !is_identifier(name) {
                    return Err(Error::InvalidStageKey {
                        key: stage.key.to_string(),
                        reason: "a method name must be an identifier".to_string(),
                    });
                }
                let context = Self::require(stage, context, ContextKind::has_reference)?;
                self.backend.post_method(stage, name, context)?
            }
            StageKind::Gradients => {
                let context = Self::require(stage, context, |k| {
                    matches!(k, ContextKind::MeanField | ContextKind::Post)
                })?;
                self.backend.gradients(stage, context)?
            }
            StageKind::GeomOpt => {
                let context = Self::require(stage, context, |k| {
                    matches!(
                        k,
                        ContextKind::MeanField | ContextKind::Post | ContextKind::Gradients
                    )
                })?;
                self.backend.geomopt(stage, context)?
            }
        };

        let values = if paths.is_empty() {
            None
        } else {
            Some(self.backend.extract(stage, &paths, &context)?)
        };
        let context = match kind {
            StageKind::GeomOpt => self.backend.optimized_system(context)?,
            _ => context,
        };
        self.context = Some(context);
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EmitBackend;
    use serde_json::json;

    fn emit(document: Value) -> Result<String> {
        let mut document = document.as_object().cloned().unwrap();
        let mut out = Vec::new();
        Task::new(EmitBackend::new(&mut out)).run(&mut document)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("MP2"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_context_rules() {
        let mole = json!({"atom": "H 0 0 0; H 0 0 0.74"});
        assert!(matches!(
            emit(json!({"HF": {}})),
            Err(Error::InapplicableContext { .. })
        ));
        assert!(matches!(
            emit(json!({"pyscf.lib.num_threads": 2, "CASSCF(2,2)": {}})),
            Err(Error::InapplicableContext { .. })
        ));
        assert!(matches!(
            emit(json!({"Mole": mole, "Gradients": {}})),
            Err(Error::InapplicableContext { .. })
        ));
        assert!(matches!(
            emit(json!({"Mole": mole, "ddCOSMO": {}})),
            Err(Error::SolventTarget(_))
        ));
        assert!(matches!(
            emit(json!({"Mole": mole, "HF": {}, "SMD": {}})),
            Err(Error::InvalidSolventModel(_))
        ));
        assert!(matches!(
            emit(json!({"Mole": mole, "HF": {}, "MP 2": {}})),
            Err(Error::InvalidStageKey { .. })
        ));
        assert!(emit(json!({"Mole": mole, "HF": {}, "ddCOSMO": {}, "MP2": {}})).is_ok());
    }

    #[test]
    fn test_malformed_result_path_fails_before_running() {
        let document = json!({
            "Mole": {"atom": "H 0 0 0; H 0 0 0.74", "results": ["atom_coords("]},
        });
        assert!(matches!(emit(document), Err(Error::PathSyntax { .. })));
    }
}
