//! Translate staged workflow configurations into quantum-chemistry runs.
//!
//! A configuration document is an ordered mapping of stage keys to stage
//! bodies. Each stage builds or transforms a computational object (a
//! molecule, a mean-field solver, a correlated method, gradients, a
//! geometry optimiser) and may request results from it by path. Stages
//! either run natively on the `scf` crate ([`execute`]) or are printed as
//! equivalent source statements ([`emit`]).
//!
//! ```no_run
//! use serde_json::json;
//!
//! let mut document = json!({
//!     "Mole": {"atom": "H 0 0 0; H 0 0 0.74", "basis": "sto-3g"},
//!     "HF": {"results": ["e_tot"]},
//!     "MP2": {"results": ["e_corr"]},
//! })
//! .as_object()
//! .cloned()
//! .unwrap();
//! let results = scfcli::execute(&mut document).unwrap();
//! println!("{}", results["MP2"]["e_corr"]);
//! ```

pub mod app;
pub mod apply;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod io;
pub mod namespace;
pub mod objects;
pub mod path;
pub mod stage;

pub use error::{Error, Result};

use backend::{EmitBackend, ExecuteBackend};
use engine::Task;
use serde_json::{Map, Value};
use std::io::Write;

/// Runs every stage natively and returns the stage -> results mapping.
/// Stage bodies in `document` get their extracted results filled in.
pub fn execute(document: &mut Map<String, Value>) -> Result<Map<String, Value>> {
    let mut task = Task::new(ExecuteBackend::new());
    task.run(document)?;
    Ok(task.into_results())
}

/// Writes the source statements equivalent to `document` to `out`.
pub fn emit<W: Write>(document: &mut Map<String, Value>, out: W) -> Result<()> {
    Task::new(EmitBackend::new(out)).run(document)
}
