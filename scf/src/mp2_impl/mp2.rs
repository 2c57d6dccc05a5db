//! Core MP2 implementation

extern crate nalgebra as na;

use crate::error::ScfError;
use crate::scf_impl::{MeanField, Reference};
use crate::spin_orbital::SpinOrbitalSystem;
use na::DMatrix;
use rayon::prelude::*;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct MP2 {
    /// Number of frozen core orbitals
    pub frozen: usize,
    /// MP2 correlation energy (calculated)
    pub e_corr: Option<f64>,
}

impl MP2 {
    pub fn new(frozen: usize) -> Self {
        MP2 {
            frozen,
            e_corr: None,
        }
    }

    /// Computes and stores the correlation energy.
    pub fn kernel(&mut self, mf: &MeanField) -> Result<f64, ScfError> {
        let e_corr = match mf.reference {
            Reference::Restricted => self.restricted(mf)?,
            Reference::Unrestricted => {
                let so = SpinOrbitalSystem::from_mean_field(mf, self.frozen)?;
                Self::spin_orbital(&so)
            }
        };
        info!("MP2 correlation energy: {:.12} Eh", e_corr);
        self.e_corr = Some(e_corr);
        Ok(e_corr)
    }

    fn restricted(&self, mf: &MeanField) -> Result<f64, ScfError> {
        let orbitals = &mf.solution()?.orbitals[0];
        let ints = mf.integrals()?;
        let nocc = orbitals.nocc();
        let nmo = orbitals.mo_energy.len();
        if self.frozen > nocc {
            return Err(ScfError::Reference {
                method: "MP2".to_string(),
                what: format!("at most {} frozen orbitals, got {}", nocc, self.frozen),
            });
        }
        let nact = nocc - self.frozen;
        let nvirt = nmo - nocc;

        info!("MP2 Initialization:");
        info!("  Number of active occupied orbitals: {}", nact);
        info!("  Number of virtual orbitals: {}", nvirt);

        let c = &orbitals.mo_coeff;
        let c_occ: DMatrix<f64> = c.columns(self.frozen, nact).into_owned();
        let c_vir: DMatrix<f64> = c.columns(nocc, nvirt).into_owned();
        // (ia|jb)
        let ovov = ints.eri.transform([&c_occ, &c_vir, &c_occ, &c_vir]);
        let eps = &orbitals.mo_energy;

        let e_corr = (0..nact)
            .into_par_iter()
            .map(|i| {
                let mut e = 0.0;
                for j in 0..nact {
                    for a in 0..nvirt {
                        for b in 0..nvirt {
                            let iajb = ovov.get(i, a, j, b);
                            let ibja = ovov.get(i, b, j, a);
                            let denom = eps[self.frozen + i] + eps[self.frozen + j]
                                - eps[nocc + a]
                                - eps[nocc + b];
                            e += iajb * (2.0 * iajb - ibja) / denom;
                        }
                    }
                }
                e
            })
            .sum();
        Ok(e_corr)
    }

    pub(crate) fn spin_orbital(so: &SpinOrbitalSystem) -> f64 {
        let o = so.nocc;
        let n = so.nso();
        let mut e = 0.0;
        for i in 0..o {
            for j in 0..o {
                for a in o..n {
                    for b in o..n {
                        let v = so.g.get(i, j, a, b);
                        e += 0.25 * v * v / (so.eps[i] + so.eps[j] - so.eps[a] - so.eps[b]);
                    }
                }
            }
        }
        e
    }
}
