//! Unconstrained minimisation
//!
//! Steepest descent and Polak-Ribière+ conjugate gradient with a
//! backtracking line search. Used for CASSCF orbital rotations and for
//! geometry optimisation on top of finite-difference gradients.

extern crate nalgebra as na;

mod cg;
mod geomopt;
mod steepest_descent;
#[cfg(test)]
mod tests;

use crate::error::ScfError;
use na::DVector;
use rayon::prelude::*;
use std::str::FromStr;
use tracing::{debug, info};

pub use geomopt::{GeomOptResult, GeometryOptimizer};

/// Displacement used by [`central_difference`].
pub const FD_STEP: f64 = 1e-4;

/// A scalar function of many variables.
pub trait Objective: Sync {
    fn value(&self, x: &DVector<f64>) -> Result<f64, ScfError>;

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>, ScfError> {
        central_difference(self, x, FD_STEP)
    }
}

/// (f(x + h e_k) - f(x - h e_k)) / 2h for every k, evaluated in parallel.
pub fn central_difference<O: Objective + ?Sized>(
    objective: &O,
    x: &DVector<f64>,
    step: f64,
) -> Result<DVector<f64>, ScfError> {
    let components: Vec<f64> = (0..x.len())
        .into_par_iter()
        .map(|k| {
            let mut plus = x.clone();
            plus[k] += step;
            let mut minus = x.clone();
            minus[k] -= step;
            Ok((objective.value(&plus)? - objective.value(&minus)?) / (2.0 * step))
        })
        .collect::<Result<_, ScfError>>()?;
    Ok(DVector::from_vec(components))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    SteepestDescent,
    ConjugateGradient,
}

impl FromStr for Algorithm {
    type Err = ScfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sd" | "steepest_descent" => Ok(Algorithm::SteepestDescent),
            "cg" | "conjugate_gradient" => Ok(Algorithm::ConjugateGradient),
            other => Err(ScfError::Unsupported(format!(
                "optimisation algorithm `{}`",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Minimizer {
    pub algorithm: Algorithm,
    pub max_cycle: usize,
    /// Energy change threshold.
    pub conv_tol: f64,
    /// Largest gradient component threshold.
    pub conv_tol_grad: f64,
    /// Largest displacement of a single variable per step.
    pub max_step: f64,
}

impl Default for Minimizer {
    fn default() -> Self {
        Minimizer {
            algorithm: Algorithm::SteepestDescent,
            max_cycle: 100,
            conv_tol: 1e-6,
            conv_tol_grad: 4.5e-4,
            max_step: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: DVector<f64>,
    pub value: f64,
    pub gradient: DVector<f64>,
    pub converged: bool,
    pub cycles: usize,
}

/// Search state shared by the algorithms.
pub(crate) struct Point {
    pub x: DVector<f64>,
    pub value: f64,
    pub gradient: DVector<f64>,
}

pub(crate) fn max_abs(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0f64, |acc, g| acc.max(g.abs()))
}

impl Minimizer {
    pub fn minimize<O: Objective>(&self, objective: &O, x0: DVector<f64>) -> Result<Minimum, ScfError> {
        info!("#####################################################");
        info!("  Minimisation ({:?})", self.algorithm);
        info!("#####################################################");
        info!("Max iterations: {}", self.max_cycle);
        info!(
            "Convergence: dE < {:.2e}, max |g| < {:.2e}",
            self.conv_tol, self.conv_tol_grad
        );
        let minimum = match self.algorithm {
            Algorithm::SteepestDescent => steepest_descent::minimize(self, objective, x0)?,
            Algorithm::ConjugateGradient => cg::minimize(self, objective, x0)?,
        };
        if minimum.converged {
            info!(
                "Optimization converged after {} iterations, value = {:.12}",
                minimum.cycles, minimum.value
            );
        } else {
            info!(
                "Optimization reached {} iterations without converging, value = {:.12}",
                minimum.cycles, minimum.value
            );
        }
        Ok(minimum)
    }

    pub(crate) fn evaluate<O: Objective>(&self, objective: &O, x: DVector<f64>) -> Result<Point, ScfError> {
        let value = objective.value(&x)?;
        let gradient = objective.gradient(&x)?;
        Ok(Point { x, value, gradient })
    }

    pub(crate) fn is_converged(&self, point: &Point, energy_change: f64) -> bool {
        max_abs(&point.gradient) < self.conv_tol_grad && energy_change.abs() < self.conv_tol
    }

    pub(crate) fn log_progress(&self, cycle: usize, point: &Point, energy_change: f64) {
        info!(
            "  Iteration {:3}: value = {:.10}  dE = {:.3e}  max |g| = {:.3e}",
            cycle,
            point.value,
            energy_change,
            max_abs(&point.gradient)
        );
    }

    /// Backtracking (Armijo) search along a descent `direction`. Returns the
    /// accepted step length and point, or `None` if no decrease was found.
    pub(crate) fn line_search<O: Objective>(
        &self,
        objective: &O,
        point: &Point,
        direction: &DVector<f64>,
        initial: f64,
    ) -> Result<Option<(f64, DVector<f64>, f64)>, ScfError> {
        let slope = point.gradient.dot(direction);
        let largest = max_abs(direction);
        if largest == 0.0 || slope >= 0.0 {
            return Ok(None);
        }
        let mut alpha = initial.min(self.max_step / largest);
        for _ in 0..30 {
            let trial = &point.x + direction * alpha;
            let value = objective.value(&trial)?;
            if value <= point.value + 1e-4 * alpha * slope {
                return Ok(Some((alpha, trial, value)));
            }
            debug!("    step {:.3e} rejected, value = {:.10}", alpha, value);
            alpha *= 0.5;
        }
        Ok(None)
    }
}
