//! CASSCF: CASCI energy minimised over orbital rotations.
//!
//! Orbitals are parametrised as C(κ) = C₀ U(κ) with the Cayley transform
//! U = (1 - κ/2)⁻¹ (1 + κ/2) of an antisymmetric κ. Only rotations between
//! different orbital classes (core, active, virtual) change the energy.

extern crate nalgebra as na;

use super::casci::{ActiveSpace, CASCI};
use crate::error::ScfError;
use crate::optim_impl::{Algorithm, Minimizer, Objective};
use crate::scf_impl::MeanField;
use na::{DMatrix, DVector};
use tracing::info;

fn orbital_class(cas: &ActiveSpace, p: usize) -> usize {
    if p < cas.ncore {
        0
    } else if p < cas.ncore + cas.ncas {
        1
    } else {
        2
    }
}

/// Orbital pairs (p < q) mixing different classes.
fn rotation_pairs(cas: &ActiveSpace, nmo: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for q in 0..nmo {
        for p in 0..q {
            if orbital_class(cas, p) != orbital_class(cas, q) {
                pairs.push((p, q));
            }
        }
    }
    pairs
}

fn cayley(pairs: &[(usize, usize)], x: &DVector<f64>, nmo: usize) -> Result<DMatrix<f64>, ScfError> {
    let mut kappa = DMatrix::zeros(nmo, nmo);
    for (&(p, q), &k) in pairs.iter().zip(x.iter()) {
        kappa[(p, q)] = k;
        kappa[(q, p)] = -k;
    }
    let id = DMatrix::<f64>::identity(nmo, nmo);
    let lhs = &id - &kappa * 0.5;
    let rhs = &id + &kappa * 0.5;
    lhs.lu()
        .solve(&rhs)
        .ok_or_else(|| ScfError::LinearAlgebra("singular Cayley transform".to_string()))
}

struct OrbitalRotation<'a> {
    mf: &'a MeanField,
    casci: &'a CASCI,
    c0: &'a DMatrix<f64>,
    pairs: &'a [(usize, usize)],
}

impl OrbitalRotation<'_> {
    fn orbitals(&self, x: &DVector<f64>) -> Result<DMatrix<f64>, ScfError> {
        Ok(self.c0 * cayley(self.pairs, x, self.c0.ncols())?)
    }
}

impl Objective for OrbitalRotation<'_> {
    fn value(&self, x: &DVector<f64>) -> Result<f64, ScfError> {
        Ok(self.casci.solve(self.mf, &self.orbitals(x)?)?.e_tot[0])
    }
}

#[derive(Debug, Clone)]
pub struct CASSCF {
    pub casci: CASCI,
    pub max_cycle: usize,
    pub conv_tol: f64,
    pub conv_tol_grad: f64,
    pub algorithm: Algorithm,
    pub e_tot: Option<f64>,
    pub converged: bool,
    pub cycles: usize,
    pub mo_coeff: Option<DMatrix<f64>>,
}

impl CASSCF {
    pub fn new(ncas: usize, nelecas: usize) -> Self {
        CASSCF {
            casci: CASCI::new(ncas, nelecas),
            max_cycle: 50,
            conv_tol: 1e-7,
            conv_tol_grad: 1e-4,
            algorithm: Algorithm::ConjugateGradient,
            e_tot: None,
            converged: false,
            cycles: 0,
            mo_coeff: None,
        }
    }

    pub fn kernel(&mut self, mf: &MeanField) -> Result<f64, ScfError> {
        let cas = self.casci.active_space(mf)?;
        let c0 = mf.solution()?.orbitals[0].mo_coeff.clone();
        let nmo = c0.ncols();
        let pairs = rotation_pairs(&cas, nmo);

        info!("===========================================");
        info!("     CASSCF({}, {})", self.casci.ncas, self.casci.nelecas);
        info!("===========================================");
        info!(
            "core: {}, active: {}, virtual: {}, rotation parameters: {}",
            cas.ncore,
            cas.ncas,
            cas.nvirt(nmo),
            pairs.len()
        );

        let objective = OrbitalRotation {
            mf,
            casci: &self.casci,
            c0: &c0,
            pairs: &pairs,
        };
        let minimizer = Minimizer {
            algorithm: self.algorithm,
            max_cycle: self.max_cycle,
            conv_tol: self.conv_tol,
            conv_tol_grad: self.conv_tol_grad,
            max_step: 0.2,
        };
        let minimum = minimizer.minimize(&objective, DVector::zeros(pairs.len()))?;
        let mo_coeff = objective.orbitals(&minimum.x)?;

        info!(
            "CASSCF energy = {:.12} Eh ({})",
            minimum.value,
            if minimum.converged {
                "converged"
            } else {
                "not converged"
            }
        );
        self.e_tot = Some(minimum.value);
        self.converged = minimum.converged;
        self.cycles = minimum.cycles;
        self.mo_coeff = Some(mo_coeff);
        Ok(minimum.value)
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_cayley_is_orthogonal() {
        let pairs = vec![(0, 1), (0, 2), (1, 2)];
        let x = DVector::from_vec(vec![0.3, -0.1, 0.7]);
        let u = cayley(&pairs, &x, 3).unwrap();
        let should_be_identity = u.transpose() * &u;
        assert!((should_be_identity - DMatrix::<f64>::identity(3, 3)).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_pairs_skip_redundant() {
        let cas = ActiveSpace {
            ncore: 1,
            ncas: 2,
            nalpha: 1,
            nbeta: 1,
        };
        let pairs = rotation_pairs(&cas, 4);
        // core-active 2, core-virtual 1, active-virtual 2
        assert_eq!(pairs.len(), 5);
        assert!(!pairs.contains(&(1, 2)));
    }
}
