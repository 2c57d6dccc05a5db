//! Geometry optimisation on the energy surface of a method.

extern crate nalgebra as na;

use super::{Algorithm, Minimizer, Objective};
use crate::error::ScfError;
use crate::grad::{GradTarget, Gradients};
use crate::mole::Mole;
use na::{DVector, Vector3};
use tracing::info;

fn to_coords(x: &DVector<f64>) -> Vec<Vector3<f64>> {
    x.as_slice()
        .chunks(3)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect()
}

struct EnergySurface<'a> {
    target: &'a GradTarget,
    step: f64,
}

impl Objective for EnergySurface<'_> {
    fn value(&self, x: &DVector<f64>) -> Result<f64, ScfError> {
        self.target.energy_at(&to_coords(x))
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>, ScfError> {
        let de = self.target.gradient_at(&to_coords(x), self.step)?;
        Ok(DVector::from_iterator(
            de.len(),
            de.transpose().iter().copied(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct GeomOptResult {
    pub converged: bool,
    /// Molecule at the final geometry.
    pub mol: Mole,
    pub e_tot: f64,
    pub cycles: usize,
}

#[derive(Debug, Clone)]
pub struct GeometryOptimizer {
    pub gradients: Gradients,
    pub max_cycle: usize,
    pub conv_tol: f64,
    pub conv_tol_grad: f64,
    /// `sd` (steepest descent) or `cg` (conjugate gradient).
    pub algorithm: String,
    result: Option<GeomOptResult>,
}

impl GeometryOptimizer {
    pub fn new(gradients: Gradients) -> Self {
        GeometryOptimizer {
            gradients,
            max_cycle: 100,
            conv_tol: 1e-6,
            conv_tol_grad: 4.5e-4,
            algorithm: "sd".to_string(),
            result: None,
        }
    }

    pub fn kernel(&mut self) -> Result<&GeomOptResult, ScfError> {
        let algorithm: Algorithm = self.algorithm.parse()?;
        let target = &self.gradients.target;
        let mol = target.mol();
        let x0 = DVector::from_iterator(
            mol.natm() * 3,
            mol.coords().iter().flat_map(|c| [c.x, c.y, c.z]),
        );

        info!("#####################################################");
        info!("-------- Starting Geometry Optimization ----------");
        info!("#####################################################");
        let surface = EnergySurface {
            target,
            step: self.gradients.step,
        };
        let minimizer = Minimizer {
            algorithm,
            max_cycle: self.max_cycle,
            conv_tol: self.conv_tol,
            conv_tol_grad: self.conv_tol_grad,
            max_step: 0.3,
        };
        let minimum = minimizer.minimize(&surface, x0)?;

        let coords = to_coords(&minimum.x);
        let mut mol = mol.clone();
        mol.set_geom(&coords)?;
        info!("    Final geometry (bohr):");
        for (i, atom) in mol.atoms().iter().enumerate() {
            info!(
                "      Atom {}: {} at [{:10.6}, {:10.6}, {:10.6}]",
                i + 1,
                atom.symbol,
                atom.coord.x,
                atom.coord.y,
                atom.coord.z
            );
        }

        Ok(self.result.insert(GeomOptResult {
            converged: minimum.converged,
            mol,
            e_tot: minimum.value,
            cycles: minimum.cycles,
        }))
    }

    pub fn result(&self) -> Result<&GeomOptResult, ScfError> {
        self.result.as_ref().ok_or(ScfError::NotRun("geometry optimizer"))
    }
}
