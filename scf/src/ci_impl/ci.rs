//! CISD and FCI on top of a mean-field reference.

extern crate nalgebra as na;

use super::active::ActiveHamiltonian;
use super::determinant::{CiSpace, MAX_DETERMINANTS};
use crate::error::ScfError;
use crate::scf_impl::MeanField;
use na::DVector;
use tracing::info;

/// Which determinants enter the expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiTarget {
    SinglesDoubles,
    Full,
}

impl CiTarget {
    pub fn name(&self) -> &'static str {
        match self {
            CiTarget::SinglesDoubles => "CISD",
            CiTarget::Full => "FCI",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CiResult {
    /// Total energies of the requested roots, lowest first.
    pub e_tot: Vec<f64>,
    /// Ground root minus the reference energy.
    pub e_corr: f64,
    /// Ground-state CI vector.
    pub ci: DVector<f64>,
    pub ndet: usize,
}

#[derive(Debug, Clone)]
pub struct CISolver {
    /// Number of frozen core orbitals
    pub frozen: usize,
    pub nroots: usize,
    pub max_determinants: usize,
}

impl Default for CISolver {
    fn default() -> Self {
        CISolver {
            frozen: 0,
            nroots: 1,
            max_determinants: MAX_DETERMINANTS,
        }
    }
}

impl CISolver {
    pub fn kernel(&self, mf: &MeanField, target: CiTarget) -> Result<CiResult, ScfError> {
        let solution = mf.solution()?;
        let ints = mf.integrals()?;
        let alpha = &solution.orbitals[0];
        let beta = solution.orbitals.get(1).unwrap_or(alpha);
        let (nalpha, nbeta) = mf.mol.nelec();
        if self.frozen > nbeta {
            return Err(ScfError::Reference {
                method: target.name().to_string(),
                what: format!("at most {} frozen orbitals, got {}", nbeta, self.frozen),
            });
        }
        let nmo = alpha.mo_energy.len();
        let norb = nmo - self.frozen;
        let (na, nb) = (nalpha - self.frozen, nbeta - self.frozen);

        info!("===========================================");
        info!("     {} Calculation", target.name());
        info!("===========================================");
        info!("Frozen orbitals: {}", self.frozen);
        info!("Correlated orbitals: {}", norb);

        let space = match target {
            CiTarget::SinglesDoubles => CiSpace::singles_doubles(norb, na, nb)?,
            CiTarget::Full => CiSpace::full(norb, na, nb)?,
        };
        let ham = ActiveHamiltonian::new(
            ints,
            [&alpha.mo_coeff, &beta.mo_coeff],
            self.frozen,
            norb,
        );
        let (e_tot, vectors) = ham.diagonalize(&space, self.nroots, self.max_determinants)?;
        let e_corr = e_tot[0] - solution.e_tot;
        info!(
            "{} total energy = {:.12} Eh, correlation = {:.12} Eh",
            target.name(),
            e_tot[0],
            e_corr
        );
        Ok(CiResult {
            e_tot,
            e_corr,
            ci: vectors.column(0).into_owned(),
            ndet: space.len(),
        })
    }
}
