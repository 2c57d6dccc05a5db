use super::{Backend, ContextKind, Contextual, DEFAULT_VERBOSE, MEAN_FIELD_MODIFIERS};
use crate::apply::{assignment_statements, call_arguments, python_literal};
use crate::error::Result;
use crate::path::Path;
use crate::stage::{McSpec, Stage, SystemKind};
use serde_json::{json, Map, Value};
use std::io::Write;

/// Variable name standing in for an object in the emitted source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: ContextKind,
}

impl Symbol {
    fn new(name: impl Into<String>, kind: ContextKind) -> Self {
        Symbol {
            name: name.into(),
            kind,
        }
    }
}

impl Contextual for Symbol {
    fn kind(&self) -> ContextKind {
        self.kind
    }
}

/// Prints source statements equivalent to executing the document.
pub struct EmitBackend<W: Write> {
    out: W,
}

impl<W: Write> EmitBackend<W> {
    pub fn new(out: W) -> Self {
        EmitBackend { out }
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    fn assignments(&mut self, stage: &Stage, name: &str, skip: &[&str]) -> Result<()> {
        let mut attributes = stage.attributes()?;
        attributes.retain(|k, _| !skip.contains(&k.as_str()));
        for statement in assignment_statements(&attributes, name) {
            self.line(&statement)?;
        }
        Ok(())
    }

    fn run(&mut self, name: &str) -> Result<()> {
        self.line(&format!("{} = {}.run()", name, name))
    }

    /// Expression for the molecule behind `context`.
    fn mol_expr(context: &Symbol) -> String {
        if context.kind.is_system() {
            context.name.clone()
        } else {
            format!("{}.mol", context.name)
        }
    }

    /// Expression for the mean-field reference behind `context`, running a
    /// default HF on a bare system.
    fn reference(&mut self, context: &Symbol) -> Result<String> {
        match context.kind {
            ContextKind::Mole | ContextKind::Cell => {
                self.line(&format!("mf = {}.HF().run()", context.name))?;
                Ok("mf".to_string())
            }
            ContextKind::Post => Ok(format!("{}._scf", context.name)),
            _ => Ok(context.name.clone()),
        }
    }
}

impl<W: Write> Backend for EmitBackend<W> {
    type Context = Symbol;

    fn begin(&mut self) -> Result<()> {
        self.line("import numpy as np")?;
        self.line("import pyscf")?;
        self.line("results = {}")
    }

    fn import(&mut self, _stage: &Stage, modules: &[String]) -> Result<()> {
        for module in modules {
            self.line(&format!("import {}", module))?;
        }
        Ok(())
    }

    fn system(&mut self, stage: &Stage, kind: SystemKind, context: Option<Symbol>) -> Result<Symbol> {
        let (name, kind) = match kind {
            SystemKind::Mole => ("mol", ContextKind::Mole),
            SystemKind::Cell => ("cell", ContextKind::Cell),
        };
        match context {
            None => {
                let mut attributes = stage.attributes()?;
                if !attributes.contains_key("verbose") {
                    attributes.insert("verbose".to_string(), json!(DEFAULT_VERBOSE));
                }
                let arguments: Vec<String> = attributes
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, python_literal(v)))
                    .collect();
                self.line(&format!("{} = pyscf.M({})", name, arguments.join(",\n    ")))?;
                Ok(Symbol::new(name, kind))
            }
            Some(context) => {
                let name = if context.kind == kind {
                    context.name
                } else {
                    self.line(&format!("{} = {}", name, Self::mol_expr(&context)))?;
                    name.to_string()
                };
                self.assignments(stage, &name, &[])?;
                self.line(&format!("{}.build()", name))?;
                Ok(Symbol::new(name, kind))
            }
        }
    }

    fn mean_field(&mut self, stage: &Stage, method: &str, context: Symbol) -> Result<Symbol> {
        self.line(&format!("mf = {}.{}()", Self::mol_expr(&context), method))?;
        self.assignments(stage, "mf", &MEAN_FIELD_MODIFIERS)?;
        let attributes = stage.attributes()?;
        for modifier in MEAN_FIELD_MODIFIERS {
            let arguments = match attributes.get(modifier) {
                None | Some(Value::Bool(false)) => continue,
                Some(Value::Null) | Some(Value::Bool(true)) => String::new(),
                Some(Value::Object(kwargs)) => call_arguments(&[], kwargs),
                Some(Value::Array(args)) => call_arguments(args, &Map::new()),
                Some(arg) => python_literal(arg),
            };
            self.line(&format!("mf = mf.{}({})", modifier, arguments))?;
        }
        self.run("mf")?;
        Ok(Symbol::new("mf", ContextKind::MeanField))
    }

    fn solvent(&mut self, stage: &Stage, model: &str, context: Symbol) -> Result<Symbol> {
        let name = context.name;
        self.line(&format!("{} = {}.{}()", name, name, model))?;
        self.assignments(stage, &name, &[])?;
        self.run(&name)?;
        Ok(Symbol::new(name, ContextKind::MeanField))
    }

    fn multi_config(&mut self, stage: &Stage, spec: &McSpec, context: Symbol) -> Result<Symbol> {
        let base = self.reference(&context)?;
        self.line(&format!(
            "mc = {}.{}({}, {})",
            base, spec.method, spec.ncas, spec.nelecas
        ))?;
        self.assignments(stage, "mc", &[])?;
        self.run("mc")?;
        Ok(Symbol::new("mc", ContextKind::Post))
    }

    fn post_method(&mut self, stage: &Stage, name: &str, context: Symbol) -> Result<Symbol> {
        let base = self.reference(&context)?;
        let symbol = name.to_lowercase();
        self.line(&format!("{} = {}.{}()", symbol, base, name))?;
        self.assignments(stage, &symbol, &[])?;
        self.run(&symbol)?;
        Ok(Symbol::new(symbol, ContextKind::Post))
    }

    fn gradients(&mut self, stage: &Stage, context: Symbol) -> Result<Symbol> {
        self.line(&format!("grad = {}.Gradients()", context.name))?;
        self.assignments(stage, "grad", &[])?;
        self.run("grad")?;
        Ok(Symbol::new("grad", ContextKind::Gradients))
    }

    fn geomopt(&mut self, stage: &Stage, context: Symbol) -> Result<Symbol> {
        let name = format!("{}_opt", context.name);
        let source = match context.kind {
            ContextKind::Gradients => format!("{}.optimizer()", context.name),
            _ => format!("{}.Gradients().optimizer()", context.name),
        };
        self.line(&format!("{} = {}", name, source))?;
        self.assignments(stage, &name, &[])?;
        self.run(&name)?;
        Ok(Symbol::new(name, ContextKind::Optimizer))
    }

    fn optimized_system(&mut self, context: Symbol) -> Result<Symbol> {
        self.line(&format!("mol = {}.mol", context.name))?;
        Ok(Symbol::new("mol", ContextKind::Mole))
    }

    fn expression(&mut self, stage: &Stage, path: &Path) -> Result<Option<Value>> {
        let (attributes, args, kwargs) = stage.invocation()?;
        for statement in assignment_statements(&attributes, path.as_str()) {
            self.line(&statement)?;
        }
        if attributes.is_empty() || !args.is_empty() || !kwargs.is_empty() {
            self.line(&format!(
                "results[{}] = {}({})",
                python_literal(&json!(stage.key)),
                path,
                call_arguments(&args, &kwargs)
            ))?;
        }
        Ok(None)
    }

    fn namespace(&self) -> Symbol {
        Symbol::new("pyscf", ContextKind::Namespace)
    }

    fn extract(&mut self, stage: &Stage, paths: &[Path], context: &Symbol) -> Result<Map<String, Value>> {
        let key = python_literal(&json!(stage.key));
        self.line(&format!("results[{}] = {{}}", key))?;
        let mut values = Map::new();
        for path in paths {
            self.line(&format!(
                "results[{}][{}] = {}.{}",
                key,
                python_literal(&json!(path.as_str())),
                context.name,
                path
            ))?;
            values.insert(path.to_string(), Value::Null);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Task;

    fn emit(document: Value) -> Vec<String> {
        let mut document = document.as_object().cloned().unwrap();
        let mut out = Vec::new();
        Task::new(EmitBackend::new(&mut out)).run(&mut document).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_and_molecule() {
        let lines = emit(json!({
            "MOLE": {"atom": "H 0 0 0; H 0 0 0.74", "basis": "sto-3g"},
        }));
        assert_eq!(
            lines,
            vec![
                "import numpy as np",
                "import pyscf",
                "results = {}",
                "mol = pyscf.M(atom = \"H 0 0 0; H 0 0 0.74\",",
                "    basis = \"sto-3g\",",
                "    verbose = 4)",
            ]
        );
    }

    #[test]
    fn test_mean_field_modifiers_follow_fixed_order() {
        let lines = emit(json!({
            "Mole": {"atom": "O 0 0 0; H 0 0.76 0.59; H 0 -0.76 0.59", "verbose": 0},
            "RHF": {"newton": null, "conv_tol": 1e-9, "density_fit": {"auxbasis": "weigend"}},
        }));
        assert_eq!(
            lines[5..],
            [
                "mf = mol.RHF()",
                "mf.conv_tol = 1e-09",
                "mf = mf.density_fit(auxbasis = \"weigend\")",
                "mf = mf.newton()",
                "mf = mf.run()",
            ]
        );
    }

    #[test]
    fn test_post_method_on_bare_system_runs_default_reference() {
        let lines = emit(json!({
            "Mole": {"atom": "H 0 0 0; H 0 0 0.74"},
            "CCSD": {"frozen": 0, "results": ["e_corr"]},
        }));
        assert_eq!(
            lines[5..],
            [
                "mf = mol.HF().run()",
                "ccsd = mf.CCSD()",
                "ccsd.frozen = 0",
                "ccsd = ccsd.run()",
                "results[\"CCSD\"] = {}",
                "results[\"CCSD\"][\"e_corr\"] = ccsd.e_corr",
            ]
        );
    }

    #[test]
    fn test_back_reference_and_geomopt() {
        let lines = emit(json!({
            "Mole": {"atom": "H 0 0 0; H 0 0 0.74"},
            "HF": {},
            "MP2": {},
            "CASCI(2,2)": {},
            "geomopt": {"results": "e_tot"},
            "Mole-2": {"verbose": 5},
        }));
        let tail: Vec<&str> = lines[5..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "mf = mol.HF()",
                "mf = mf.run()",
                "mp2 = mf.MP2()",
                "mp2 = mp2.run()",
                "mc = mp2._scf.CASCI(2, 2)",
                "mc = mc.run()",
                "mc_opt = mc.Gradients().optimizer()",
                "mc_opt = mc_opt.run()",
                "results[\"geomopt\"] = {}",
                "results[\"geomopt\"][\"e_tot\"] = mc_opt.e_tot",
                "mol = mc_opt.mol",
                "mol.verbose = 5",
                "mol.build()",
            ]
        );
    }

    #[test]
    fn test_import_and_expression() {
        let lines = emit(json!({
            "import": ["pyscf.mcscf"],
            "pyscf.lib.num_threads": {"args": [4]},
            "pyscf.lib.param": {"BOHR": 0.52917721092},
        }));
        assert_eq!(
            lines[3..],
            [
                "import pyscf.mcscf",
                "results[\"pyscf.lib.num_threads\"] = pyscf.lib.num_threads(4)",
                "pyscf.lib.param.BOHR = 0.52917721092",
            ]
        );
    }
}
