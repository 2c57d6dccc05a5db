//! Stage handlers, one implementation per execution mode.
//!
//! [`ExecuteBackend`] builds and runs native objects; [`EmitBackend`]
//! prints the equivalent source statements without computing anything.
//! Both are driven by the same [`crate::engine::Task`], which classifies
//! stages and checks that the current context fits before dispatching.

mod emit;
mod execute;

pub use emit::{EmitBackend, Symbol};
pub use execute::{Context, ExecuteBackend, System};

use crate::error::Result;
use crate::path::Path;
use crate::stage::{McSpec, Stage, SystemKind};
use serde_json::{Map, Value};
use std::fmt;

/// Mean-field modifiers, in the order they are applied.
pub const MEAN_FIELD_MODIFIERS: [&str; 7] = [
    "density_fit",
    "mix_density_fit",
    "x2c",
    "sfx2c",
    "x2c1e",
    "sfx2c1e",
    "newton",
];

/// Default `verbose` of freshly created systems.
pub const DEFAULT_VERBOSE: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Namespace,
    Mole,
    Cell,
    MeanField,
    Post,
    Gradients,
    Optimizer,
}

impl ContextKind {
    pub fn is_system(self) -> bool {
        matches!(self, ContextKind::Mole | ContextKind::Cell)
    }

    /// Contexts a mean-field reference can be taken from.
    pub fn has_reference(self) -> bool {
        self.is_system() || matches!(self, ContextKind::MeanField | ContextKind::Post)
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextKind::Namespace => "a module namespace",
            ContextKind::Mole => "a molecule",
            ContextKind::Cell => "a periodic cell",
            ContextKind::MeanField => "a mean-field object",
            ContextKind::Post => "a post-method object",
            ContextKind::Gradients => "a gradients object",
            ContextKind::Optimizer => "a geometry optimizer",
        };
        f.write_str(name)
    }
}

pub trait Contextual {
    fn kind(&self) -> ContextKind;
}

pub trait Backend {
    type Context: Contextual;

    fn begin(&mut self) -> Result<()>;

    fn import(&mut self, stage: &Stage, modules: &[String]) -> Result<()>;

    /// `context` is `None` for a fresh system.
    fn system(
        &mut self,
        stage: &Stage,
        kind: SystemKind,
        context: Option<Self::Context>,
    ) -> Result<Self::Context>;

    fn mean_field(&mut self, stage: &Stage, method: &str, context: Self::Context) -> Result<Self::Context>;

    fn solvent(&mut self, stage: &Stage, model: &str, context: Self::Context) -> Result<Self::Context>;

    fn multi_config(&mut self, stage: &Stage, spec: &McSpec, context: Self::Context) -> Result<Self::Context>;

    fn post_method(&mut self, stage: &Stage, name: &str, context: Self::Context) -> Result<Self::Context>;

    fn gradients(&mut self, stage: &Stage, context: Self::Context) -> Result<Self::Context>;

    fn geomopt(&mut self, stage: &Stage, context: Self::Context) -> Result<Self::Context>;

    /// Context after a geometry optimisation: the optimised system.
    fn optimized_system(&mut self, context: Self::Context) -> Result<Self::Context>;

    /// Returns the value to record under the stage key, if any.
    fn expression(&mut self, stage: &Stage, path: &Path) -> Result<Option<Value>>;

    fn namespace(&self) -> Self::Context;

    fn extract(
        &mut self,
        stage: &Stage,
        paths: &[Path],
        context: &Self::Context,
    ) -> Result<Map<String, Value>>;
}
