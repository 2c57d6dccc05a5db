//! Module namespace for free-form expression stages.
//!
//! Dotted stage keys such as `pyscf.lib.num_threads` resolve against a
//! registry of modules. A module holds plain data attributes, functions
//! and sub-modules. `numpy` (as `np`) and `pyscf` are bound from the start;
//! everything else has to go through an import stage first.

use crate::error::{Error, Result};
use crate::objects::{float, Attr, Attributes};
use crate::path::Path;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::f64::consts::{E, PI};
use tracing::{info, warn};

pub type Function = fn(&[Value], &Map<String, Value>) -> Result<Value>;

#[derive(Clone, Default)]
pub struct Module {
    pub name: String,
    data: BTreeMap<String, Value>,
    functions: BTreeMap<String, Function>,
    children: BTreeMap<String, Module>,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("data", &self.data)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}

impl Module {
    fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn with_data(mut self, name: &str, value: Value) -> Self {
        self.data.insert(name.to_string(), value);
        self
    }

    fn with_function(mut self, name: &str, function: Function) -> Self {
        self.functions.insert(name.to_string(), function);
        self
    }

    fn with_child(mut self, child: Module) -> Self {
        let short = child.name.rsplit('.').next().unwrap_or(&child.name).to_string();
        self.children.insert(short, child);
        self
    }

    fn child(&self, dotted: &str) -> Option<&Module> {
        dotted
            .split('.')
            .try_fold(self, |module, name| module.children.get(name))
    }
}

impl Attributes for Module {
    fn type_name(&self) -> &'static str {
        "module"
    }

    fn get_attr(&self, name: &str) -> Result<Attr<'_>> {
        if let Some(child) = self.children.get(name) {
            Ok(Attr::Object(child))
        } else if let Some(value) = self.data.get(name) {
            Ok(Attr::Data(value.clone()))
        } else if self.functions.contains_key(name) {
            Ok(Attr::Method)
        } else {
            Err(Error::UnknownAttribute {
                type_name: self.name.clone(),
                attr: name.to_string(),
            })
        }
    }

    /// Only existing data attributes can be reassigned.
    fn set_attr(&mut self, name: &str, value: &Value) -> Result<()> {
        match self.data.get_mut(name) {
            Some(slot) => {
                *slot = value.clone();
                Ok(())
            }
            None => Err(Error::UnknownAttribute {
                type_name: self.name.clone(),
                attr: name.to_string(),
            }),
        }
    }

    fn attr_object_mut(&mut self, name: &str) -> Option<&mut dyn Attributes> {
        self.children
            .get_mut(name)
            .map(|child| child as &mut dyn Attributes)
    }

    fn call(&self, name: &str) -> Result<Value> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| Error::NotCallable(format!("{}.{}", self.name, name)))?;
        function(&[], &Map::new())
    }
}

fn number_arg(function: &str, args: &[Value]) -> Result<f64> {
    args.first()
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::InvalidAttribute {
            type_name: "function".to_string(),
            attr: function.to_string(),
            reason: format!("expected one numeric argument, got {:?}", args),
        })
}

fn sqrt(args: &[Value], _: &Map<String, Value>) -> Result<Value> {
    Ok(float(number_arg("sqrt", args)?.sqrt()))
}

fn exp(args: &[Value], _: &Map<String, Value>) -> Result<Value> {
    Ok(float(number_arg("exp", args)?.exp()))
}

fn log(args: &[Value], _: &Map<String, Value>) -> Result<Value> {
    Ok(float(number_arg("log", args)?.ln()))
}

fn cos(args: &[Value], _: &Map<String, Value>) -> Result<Value> {
    Ok(float(number_arg("cos", args)?.cos()))
}

fn sin(args: &[Value], _: &Map<String, Value>) -> Result<Value> {
    Ok(float(number_arg("sin", args)?.sin()))
}

/// `num_threads(n)` sizes the global rayon pool; without an argument it
/// reports the current size.
fn num_threads(args: &[Value], kwargs: &Map<String, Value>) -> Result<Value> {
    let requested = args.first().or_else(|| kwargs.get("n"));
    match requested {
        None | Some(Value::Null) => Ok(json!(rayon::current_num_threads())),
        Some(value) => {
            let n = value
                .as_u64()
                .filter(|&n| n > 0)
                .ok_or_else(|| Error::InvalidAttribute {
                    type_name: "function".to_string(),
                    attr: "num_threads".to_string(),
                    reason: format!("expected a positive integer, got {}", value),
                })? as usize;
            match rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
                Ok(()) => info!("using {} threads", n),
                Err(e) => warn!("thread pool already initialised, keeping {} threads: {}", rayon::current_num_threads(), e),
            }
            Ok(json!(rayon::current_num_threads()))
        }
    }
}

fn math_like(name: &str) -> Module {
    Module::new(name)
        .with_data("pi", float(PI))
        .with_data("e", float(E))
        .with_function("sqrt", sqrt)
        .with_function("exp", exp)
        .with_function("log", log)
        .with_function("cos", cos)
        .with_function("sin", sin)
}

fn pyscf() -> Module {
    let param = Module::new("pyscf.lib.param").with_data("BOHR", float(scf::mole::BOHR));
    let lib = Module::new("pyscf.lib")
        .with_child(param)
        .with_function("num_threads", num_threads);
    let mut pyscf = Module::new("pyscf")
        .with_data("__version__", json!(env!("CARGO_PKG_VERSION")))
        .with_child(lib);
    for sub in [
        "gto", "scf", "dft", "mp", "ci", "cc", "fci", "mcscf", "tdscf", "grad", "geomopt",
        "solvent", "pbc",
    ] {
        pyscf = pyscf.with_child(Module::new(&format!("pyscf.{}", sub)));
    }
    pyscf
}

/// Registered packages and the names bound in the current run.
#[derive(Debug, Clone)]
pub struct Namespace {
    packages: BTreeMap<String, Module>,
    /// bound name -> package
    bound: BTreeMap<String, String>,
}

impl Default for Namespace {
    fn default() -> Self {
        let packages: BTreeMap<String, Module> = [pyscf(), math_like("numpy"), math_like("math")]
            .into_iter()
            .map(|m| (m.name.clone(), m))
            .collect();
        let bound = [("pyscf", "pyscf"), ("numpy", "numpy"), ("np", "numpy")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Namespace { packages, bound }
    }
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the top-level package of a dotted module name.
    pub fn import(&mut self, module: &str) -> Result<()> {
        let (package, rest) = module.split_once('.').unwrap_or((module, ""));
        let root = self
            .packages
            .get(package)
            .ok_or_else(|| Error::UnknownModule(module.to_string()))?;
        if !rest.is_empty() && root.child(rest).is_none() {
            return Err(Error::UnknownModule(module.to_string()));
        }
        self.bound.insert(package.to_string(), package.to_string());
        Ok(())
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bound.contains_key(name)
    }

    fn root_mut(&mut self, path: &Path) -> Result<&mut Module> {
        let first = &path.segments[0].name;
        let package = self
            .bound
            .get(first)
            .ok_or_else(|| Error::UnknownModule(first.clone()))?;
        self.packages
            .get_mut(package)
            .ok_or_else(|| Error::UnknownModule(first.clone()))
    }

    /// Resolves `path`, applies `attributes` to the module it names, or
    /// calls the function it names with `args` and `kwargs`. Returns the
    /// call result, or `None` when the path names a module or a value.
    pub fn evaluate(
        &mut self,
        path: &Path,
        attributes: &Map<String, Value>,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        if let Some(segment) = path.segments.iter().find(|s| !s.suffixes.is_empty()) {
            return Err(Error::PathSyntax {
                path: path.to_string(),
                reason: format!("`{}` takes no call or index suffix in a stage key", segment.name),
            });
        }
        let mut module = self.root_mut(path)?;
        let names: Vec<&str> = path.segments[1..].iter().map(|s| s.name.as_str()).collect();
        let Some((last, parents)) = names.split_last() else {
            crate::apply::apply(module, attributes)?;
            return Ok(None);
        };
        for name in parents {
            let type_name = module.name.clone();
            module = module
                .children
                .get_mut(*name)
                .ok_or_else(|| Error::UnknownAttribute {
                    type_name,
                    attr: name.to_string(),
                })?;
        }
        if let Some(function) = module.functions.get(*last) {
            if !attributes.is_empty() {
                return Err(Error::InvalidBody {
                    stage: path.to_string(),
                    reason: "a function takes args and kwargs only".to_string(),
                });
            }
            return function(args, kwargs).map(Some);
        }
        if let Some(child) = module.children.get_mut(*last) {
            crate::apply::apply(child, attributes)?;
            return Ok(None);
        }
        // only calls produce a result
        if module.data.contains_key(*last) {
            if !attributes.is_empty() {
                return Err(Error::InvalidBody {
                    stage: path.to_string(),
                    reason: format!("`{}` is a value, not a module", last),
                });
            }
            if !args.is_empty() || !kwargs.is_empty() {
                return Err(Error::NotCallable(path.to_string()));
            }
            return Ok(None);
        }
        Err(Error::UnknownAttribute {
            type_name: module.name.clone(),
            attr: last.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(ns: &mut Namespace, key: &str, args: &[Value]) -> Result<Option<Value>> {
        ns.evaluate(&Path::parse(key).unwrap(), &Map::new(), args, &Map::new())
    }

    fn data(ns: &Namespace, package: &str, path: &str) -> Value {
        crate::extract::resolve(&ns.packages[package], &Path::parse(path).unwrap()).unwrap()
    }

    #[test]
    fn test_default_bindings() {
        let mut ns = Namespace::new();
        let sqrt2 = eval(&mut ns, "np.sqrt", &[json!(2.0)]).unwrap().unwrap();
        assert!((sqrt2.as_f64().unwrap() - 2f64.sqrt()).abs() < 1e-15);
        assert!(eval(&mut ns, "pyscf.lib.num_threads", &[]).unwrap().unwrap().as_u64().unwrap() >= 1);
        assert!(matches!(eval(&mut ns, "math.pi", &[]), Err(Error::UnknownModule(_))));
    }

    #[test]
    fn test_import_binds_package() {
        let mut ns = Namespace::new();
        ns.import("math").unwrap();
        assert!(ns.is_bound("math"));
        assert_eq!(eval(&mut ns, "math.pi", &[]).unwrap(), None);
        assert!(matches!(eval(&mut ns, "math.pi", &[json!(1)]), Err(Error::NotCallable(_))));
        assert_eq!(data(&ns, "math", "pi"), json!(PI));
        ns.import("pyscf.mcscf").unwrap();
        assert!(matches!(ns.import("pyscf.nosuch"), Err(Error::UnknownModule(_))));
        assert!(matches!(ns.import("scipy"), Err(Error::UnknownModule(_))));
    }

    #[test]
    fn test_module_attributes() {
        let mut ns = Namespace::new();
        let attributes: Map<String, Value> =
            [("BOHR".to_string(), json!(0.5))].into_iter().collect();
        let path = Path::parse("pyscf.lib.param").unwrap();
        assert_eq!(ns.evaluate(&path, &attributes, &[], &Map::new()).unwrap(), None);
        assert_eq!(data(&ns, "pyscf", "lib.param.BOHR"), json!(0.5));

        let nested: Map<String, Value> =
            [("param".to_string(), json!({"BOHR": 0.25}))].into_iter().collect();
        let lib = Path::parse("pyscf.lib").unwrap();
        assert_eq!(ns.evaluate(&lib, &nested, &[], &Map::new()).unwrap(), None);
        assert_eq!(data(&ns, "pyscf", "lib.param.BOHR"), json!(0.25));

        let bad: Map<String, Value> = [("nope".to_string(), json!(1))].into_iter().collect();
        assert!(ns.evaluate(&path, &bad, &[], &Map::new()).is_err());
        let on_value = Path::parse("pyscf.lib.param.BOHR").unwrap();
        assert!(matches!(
            ns.evaluate(&on_value, &attributes, &[], &Map::new()),
            Err(Error::InvalidBody { .. })
        ));
        assert!(matches!(eval(&mut ns, "pyscf.lib.num_threads()", &[]), Err(Error::PathSyntax { .. })));
    }
}
