use super::{Backend, ContextKind, Contextual, DEFAULT_VERBOSE, MEAN_FIELD_MODIFIERS};
use crate::apply::apply;
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::namespace::Namespace;
use crate::objects::Attributes;
use crate::path::Path;
use crate::stage::{McSpec, Stage, SystemKind};
use scf::{Cell, GeometryOptimizer, GradTarget, Gradients, MeanField, Method, Mole, PostMethod};
use serde_json::{Map, Value};
use tracing::info;

#[derive(Debug, Clone)]
pub enum System {
    Mole(Mole),
    Cell(Cell),
}

impl System {
    fn mol(&self) -> &Mole {
        match self {
            System::Mole(mol) => mol,
            System::Cell(cell) => &cell.mol,
        }
    }

    fn build(&mut self) -> Result<()> {
        match self {
            System::Mole(mol) => mol.build()?,
            System::Cell(cell) => cell.build()?,
        }
        Ok(())
    }

    fn attributes_mut(&mut self) -> &mut dyn Attributes {
        match self {
            System::Mole(mol) => mol,
            System::Cell(cell) => cell,
        }
    }
}

/// Native object flowing between stages.
#[derive(Debug, Clone)]
pub enum Context {
    Namespace,
    System(System),
    MeanField(Box<MeanField>),
    Post(Box<PostMethod>),
    Gradients(Box<Gradients>),
    Optimizer(Box<GeometryOptimizer>),
}

impl Contextual for Context {
    fn kind(&self) -> ContextKind {
        match self {
            Context::Namespace => ContextKind::Namespace,
            Context::System(System::Mole(_)) => ContextKind::Mole,
            Context::System(System::Cell(_)) => ContextKind::Cell,
            Context::MeanField(_) => ContextKind::MeanField,
            Context::Post(_) => ContextKind::Post,
            Context::Gradients(_) => ContextKind::Gradients,
            Context::Optimizer(_) => ContextKind::Optimizer,
        }
    }
}

impl Context {
    /// The molecule carried by this context.
    fn mol(&self) -> Result<&Mole> {
        match self {
            Context::Namespace => Err(Error::NotAValue("namespace".to_string())),
            Context::System(system) => Ok(system.mol()),
            Context::MeanField(mf) => Ok(&mf.mol),
            Context::Post(post) => Ok(&post.base.mol),
            Context::Gradients(grad) => Ok(grad.mol()),
            Context::Optimizer(opt) => match opt.result() {
                Ok(result) => Ok(&result.mol),
                Err(_) => Ok(opt.gradients.mol()),
            },
        }
    }

    pub fn as_attributes(&self) -> Option<&dyn Attributes> {
        match self {
            Context::Namespace => None,
            Context::System(System::Mole(mol)) => Some(mol),
            Context::System(System::Cell(cell)) => Some(cell),
            Context::MeanField(mf) => Some(mf.as_ref()),
            Context::Post(post) => Some(post.as_ref()),
            Context::Gradients(grad) => Some(grad.as_ref()),
            Context::Optimizer(opt) => Some(opt.as_ref()),
        }
    }
}

/// Builds and runs native objects.
#[derive(Debug, Clone)]
pub struct ExecuteBackend {
    namespace: Namespace,
}

impl Default for ExecuteBackend {
    fn default() -> Self {
        ExecuteBackend {
            namespace: Namespace::new(),
        }
    }
}

impl ExecuteBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mean-field object a correlated method starts from. A bare
    /// system gets a default Hartree-Fock reference.
    fn reference(stage: &Stage, context: Context) -> Result<MeanField> {
        match context {
            Context::System(System::Mole(mol)) => {
                info!("no mean-field stage before `{}`, using a default HF reference", stage.key);
                Ok(MeanField::new("HF", mol)?)
            }
            Context::System(System::Cell(_)) => {
                Err(Error::Unsupported("periodic mean-field references".to_string()))
            }
            Context::MeanField(mf) => Ok(*mf),
            Context::Post(post) => {
                let post = *post;
                Ok(post.base)
            }
            other => Err(Error::InapplicableContext {
                stage: stage.key.to_string(),
                context: other.kind().to_string(),
            }),
        }
    }

    fn run_post(stage: &Stage, method: Method, context: Context) -> Result<Context> {
        let base = Self::reference(stage, context)?;
        let mut post = PostMethod::new(method, base);
        apply(&mut post, &stage.attributes()?)?;
        post.kernel()?;
        Ok(Context::Post(Box::new(post)))
    }

    fn grad_target(stage: &Stage, context: Context) -> Result<GradTarget> {
        match context {
            Context::MeanField(mf) => Ok(GradTarget::MeanField(*mf)),
            Context::Post(post) => Ok(GradTarget::Post(*post)),
            other => Err(Error::InapplicableContext {
                stage: stage.key.to_string(),
                context: other.kind().to_string(),
            }),
        }
    }
}

impl Backend for ExecuteBackend {
    type Context = Context;

    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn import(&mut self, _stage: &Stage, modules: &[String]) -> Result<()> {
        for module in modules {
            self.namespace.import(module)?;
            info!("imported {}", module);
        }
        Ok(())
    }

    fn system(&mut self, stage: &Stage, kind: SystemKind, context: Option<Context>) -> Result<Context> {
        let mut system = match (kind, context) {
            (SystemKind::Mole, None) => {
                let mut mol = Mole::new();
                mol.verbose = DEFAULT_VERBOSE;
                System::Mole(mol)
            }
            (SystemKind::Cell, None) => {
                let mut cell = Cell::new();
                cell.mol.verbose = DEFAULT_VERBOSE;
                System::Cell(cell)
            }
            (SystemKind::Mole, Some(Context::System(System::Cell(cell)))) => System::Mole(cell.mol),
            (SystemKind::Cell, Some(Context::System(System::Mole(mol)))) => {
                let mut cell = Cell::new();
                cell.mol = mol;
                System::Cell(cell)
            }
            (_, Some(Context::System(system))) => system,
            (SystemKind::Mole, Some(other)) => System::Mole(other.mol()?.clone()),
            (SystemKind::Cell, Some(other)) => {
                let mut cell = Cell::new();
                cell.mol = other.mol()?.clone();
                System::Cell(cell)
            }
        };
        apply(system.attributes_mut(), &stage.attributes()?)?;
        system.build()?;
        let mol = system.mol();
        info!(
            "{} atoms, {} electrons, {} basis functions",
            mol.natm(),
            mol.nelectron(),
            mol.nao_nr()
        );
        Ok(Context::System(system))
    }

    fn mean_field(&mut self, stage: &Stage, method: &str, context: Context) -> Result<Context> {
        if context.kind() == ContextKind::Cell {
            return Err(Error::Unsupported(format!("periodic {} mean field", method)));
        }
        let attributes = stage.attributes()?;
        // density fitting, relativistic and second-order solvers (like the
        // solvent models below) have no native counterpart and are emitted only
        if let Some(modifier) = MEAN_FIELD_MODIFIERS
            .iter()
            .find(|m| attributes.contains_key(**m))
        {
            return Err(Error::Unsupported(format!("mean-field modifier `{}`", modifier)));
        }
        let mut mf = MeanField::new(method, context.mol()?.clone())?;
        // molecule changes made through the mean-field body need a rebuild
        let rebuild = attributes.contains_key("mol");
        apply(&mut mf, &attributes)?;
        if rebuild {
            mf.mol.build()?;
        }
        mf.kernel()?;
        Ok(Context::MeanField(Box::new(mf)))
    }

    fn solvent(&mut self, _stage: &Stage, model: &str, _context: Context) -> Result<Context> {
        Err(Error::Unsupported(format!("{} solvent model", model)))
    }

    fn multi_config(&mut self, stage: &Stage, spec: &McSpec, context: Context) -> Result<Context> {
        let (ncas, nelecas) = (spec.ncas, spec.nelecas);
        let method = match spec.method.to_uppercase().as_str() {
            "CASCI" => Method::CASCI { ncas, nelecas },
            "CASSCF" => Method::CASSCF { ncas, nelecas },
            _ => {
                return Err(Error::Unsupported(format!(
                    "multi-configuration method {}",
                    spec.method
                )))
            }
        };
        Self::run_post(stage, method, context)
    }

    fn post_method(&mut self, stage: &Stage, name: &str, context: Context) -> Result<Context> {
        Self::run_post(stage, Method::from_name(name)?, context)
    }

    fn gradients(&mut self, stage: &Stage, context: Context) -> Result<Context> {
        let mut grad = Gradients::new(Self::grad_target(stage, context)?);
        apply(&mut grad, &stage.attributes()?)?;
        grad.kernel()?;
        Ok(Context::Gradients(Box::new(grad)))
    }

    fn geomopt(&mut self, stage: &Stage, context: Context) -> Result<Context> {
        let grad = match context {
            Context::Gradients(grad) => *grad,
            other => Gradients::new(Self::grad_target(stage, other)?),
        };
        let mut opt = GeometryOptimizer::new(grad);
        apply(&mut opt, &stage.attributes()?)?;
        let result = opt.kernel()?;
        info!(
            "geometry optimisation {} after {} cycles, E = {:.12}",
            if result.converged { "converged" } else { "not converged" },
            result.cycles,
            result.e_tot
        );
        Ok(Context::Optimizer(Box::new(opt)))
    }

    fn optimized_system(&mut self, context: Context) -> Result<Context> {
        match context {
            Context::Optimizer(opt) => Ok(Context::System(System::Mole(opt.result()?.mol.clone()))),
            other => Ok(other),
        }
    }

    fn expression(&mut self, stage: &Stage, path: &Path) -> Result<Option<Value>> {
        let (attributes, args, kwargs) = stage.invocation()?;
        self.namespace.evaluate(path, &attributes, &args, &kwargs)
    }

    fn namespace(&self) -> Context {
        Context::Namespace
    }

    fn extract(&mut self, stage: &Stage, paths: &[Path], context: &Context) -> Result<Map<String, Value>> {
        let object = context.as_attributes().ok_or_else(|| Error::InapplicableContext {
            stage: stage.key.to_string(),
            context: context.kind().to_string(),
        })?;
        extract(object, paths)
    }
}
