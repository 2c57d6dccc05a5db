//! Complete active space CI.

extern crate nalgebra as na;

use super::active::ActiveHamiltonian;
use super::ci::CiResult;
use super::determinant::{CiSpace, MAX_DETERMINANTS};
use crate::error::ScfError;
use crate::mole::Mole;
use crate::scf_impl::MeanField;
use na::DMatrix;
use tracing::info;

/// Partition of the orbitals into core, active and virtual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSpace {
    pub ncore: usize,
    pub ncas: usize,
    pub nalpha: usize,
    pub nbeta: usize,
}

impl ActiveSpace {
    /// Doubly occupied core below `ncas` orbitals holding `nelecas`
    /// electrons; the unpaired electrons of the molecule live in the
    /// active space.
    pub fn new(mol: &Mole, nmo: usize, ncas: usize, nelecas: usize) -> Result<Self, ScfError> {
        let nelec = mol.nelectron();
        let spin = mol.spin.max(0) as usize;
        let invalid = |reason: &str| ScfError::ActiveSpace {
            norb: ncas,
            nelec: nelecas,
            reason: reason.to_string(),
        };
        if ncas == 0 {
            return Err(invalid("no active orbitals"));
        }
        if nelecas > nelec {
            return Err(invalid("more active electrons than the molecule has"));
        }
        if (nelec - nelecas) % 2 != 0 {
            return Err(invalid("the core must hold an even number of electrons"));
        }
        if nelecas < spin || (nelecas - spin) % 2 != 0 {
            return Err(invalid("the active electrons cannot carry the molecule's spin"));
        }
        let ncore = (nelec - nelecas) / 2;
        if ncore + ncas > nmo {
            return Err(invalid("core and active orbitals exceed the basis"));
        }
        let nalpha = (nelecas + spin) / 2;
        let nbeta = nelecas - nalpha;
        if nalpha > ncas {
            return Err(invalid("more electrons of one spin than active orbitals"));
        }
        Ok(ActiveSpace {
            ncore,
            ncas,
            nalpha,
            nbeta,
        })
    }

    pub fn nvirt(&self, nmo: usize) -> usize {
        nmo - self.ncore - self.ncas
    }
}

#[derive(Debug, Clone)]
pub struct CASCI {
    pub ncas: usize,
    pub nelecas: usize,
    pub nroots: usize,
    pub max_determinants: usize,
    pub result: Option<CiResult>,
}

impl CASCI {
    pub fn new(ncas: usize, nelecas: usize) -> Self {
        CASCI {
            ncas,
            nelecas,
            nroots: 1,
            max_determinants: MAX_DETERMINANTS,
            result: None,
        }
    }

    pub fn active_space(&self, mf: &MeanField) -> Result<ActiveSpace, ScfError> {
        let nmo = mf.solution()?.orbitals[0].mo_energy.len();
        ActiveSpace::new(&mf.mol, nmo, self.ncas, self.nelecas)
    }

    /// CASCI energies with the given orbitals (the same for both spins).
    pub(crate) fn solve(&self, mf: &MeanField, mo_coeff: &DMatrix<f64>) -> Result<CiResult, ScfError> {
        let cas = self.active_space(mf)?;
        let ints = mf.integrals()?;
        let ham = ActiveHamiltonian::new(ints, [mo_coeff, mo_coeff], cas.ncore, cas.ncas);
        let space = CiSpace::full(cas.ncas, cas.nalpha, cas.nbeta)?;
        let (e_tot, vectors) = ham.diagonalize(&space, self.nroots, self.max_determinants)?;
        Ok(CiResult {
            e_corr: e_tot[0] - mf.e_tot()?,
            e_tot,
            ci: vectors.column(0).into_owned(),
            ndet: space.len(),
        })
    }

    pub fn kernel(&mut self, mf: &MeanField) -> Result<f64, ScfError> {
        let cas = self.active_space(mf)?;
        info!("===========================================");
        info!("     CASCI({}, {})", self.ncas, self.nelecas);
        info!("===========================================");
        info!(
            "core orbitals: {}, active electrons: ({}, {})",
            cas.ncore, cas.nalpha, cas.nbeta
        );
        let mo_coeff = mf.solution()?.orbitals[0].mo_coeff.clone();
        let result = self.solve(mf, &mo_coeff)?;
        let e_tot = result.e_tot[0];
        info!("CASCI E = {:.12} Eh, E(CI) correlation = {:.12} Eh", e_tot, result.e_corr);
        self.result = Some(result);
        Ok(e_tot)
    }

    pub fn e_tot(&self) -> Result<f64, ScfError> {
        self.result
            .as_ref()
            .map(|r| r.e_tot[0])
            .ok_or(ScfError::NotRun("CASCI"))
    }
}
