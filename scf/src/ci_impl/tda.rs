//! Tamm-Dancoff excitation energies (CIS on a Hartree-Fock reference).

extern crate nalgebra as na;

use crate::error::ScfError;
use crate::scf_impl::{sorted_symmetric_eigen, MeanField, Reference};
use crate::spin_orbital::SpinOrbitalSystem;
use na::DMatrix;
use tracing::info;

#[derive(Debug, Clone)]
pub struct TDA {
    pub nstates: usize,
    /// Singlet or triplet spin adaptation of a restricted reference.
    pub singlet: bool,
    /// Excitation energies in Eh.
    pub e: Option<Vec<f64>>,
}

impl Default for TDA {
    fn default() -> Self {
        TDA::new(3, true)
    }
}

impl TDA {
    pub fn new(nstates: usize, singlet: bool) -> Self {
        TDA {
            nstates,
            singlet,
            e: None,
        }
    }

    /// A_ia,jb = δ_ij δ_ab (ε_a - ε_i) + 2 (ia|jb) - (ij|ab) for singlets,
    /// without the Coulomb term for triplets.
    fn restricted_matrix(&self, mf: &MeanField) -> Result<DMatrix<f64>, ScfError> {
        let orbitals = &mf.solution()?.orbitals[0];
        let ints = mf.integrals()?;
        let nocc = orbitals.nocc();
        let nmo = orbitals.mo_energy.len();
        let nvirt = nmo - nocc;
        let c = &orbitals.mo_coeff;
        let c_occ = c.columns(0, nocc).into_owned();
        let c_vir = c.columns(nocc, nvirt).into_owned();
        let ovov = ints.eri.transform([&c_occ, &c_vir, &c_occ, &c_vir]);
        let oovv = ints.eri.transform([&c_occ, &c_occ, &c_vir, &c_vir]);
        let eps = &orbitals.mo_energy;
        let coulomb = if self.singlet { 2.0 } else { 0.0 };

        let dim = nocc * nvirt;
        Ok(DMatrix::from_fn(dim, dim, |ia, jb| {
            let (i, a) = (ia / nvirt, ia % nvirt);
            let (j, b) = (jb / nvirt, jb % nvirt);
            let mut v = coulomb * ovov.get(i, a, j, b) - oovv.get(i, j, a, b);
            if ia == jb {
                v += eps[nocc + a] - eps[i];
            }
            v
        }))
    }

    /// Spin-conserving single excitations of an unrestricted reference:
    /// A_ia,jb = δ_ij δ_ab (ε_a - ε_i) + <aj||ib>.
    fn spin_orbital_matrix(mf: &MeanField) -> Result<DMatrix<f64>, ScfError> {
        let so = SpinOrbitalSystem::from_mean_field(mf, 0)?;
        let o = so.nocc;
        let singles: Vec<(usize, usize)> = (0..o)
            .flat_map(|i| (o..so.nso()).map(move |a| (i, a)))
            .filter(|&(i, a)| so.spin[i] == so.spin[a])
            .collect();
        let dim = singles.len();
        Ok(DMatrix::from_fn(dim, dim, |x, y| {
            let (i, a) = singles[x];
            let (j, b) = singles[y];
            let mut v = so.g.get(a, j, i, b);
            if x == y {
                v += so.eps[a] - so.eps[i];
            }
            v
        }))
    }

    pub fn kernel(&mut self, mf: &MeanField) -> Result<Vec<f64>, ScfError> {
        info!("===========================================");
        info!("     TDA excited states");
        info!("===========================================");
        let a = match mf.reference {
            Reference::Restricted => {
                info!("{} excitations", if self.singlet { "singlet" } else { "triplet" });
                self.restricted_matrix(mf)?
            }
            Reference::Unrestricted => Self::spin_orbital_matrix(mf)?,
        };
        if a.nrows() == 0 {
            return Err(ScfError::Reference {
                method: "TDA".to_string(),
                what: "at least one virtual orbital".to_string(),
            });
        }
        let (values, _) = sorted_symmetric_eigen(a);
        let e: Vec<f64> = values.iter().take(self.nstates).copied().collect();
        for (k, de) in e.iter().enumerate() {
            info!(
                "  state {:2}: {:.8} Eh  {:.4} eV",
                k + 1,
                de,
                de * HARTREE2EV
            );
        }
        self.e = Some(e.clone());
        Ok(e)
    }
}

const HARTREE2EV: f64 = 27.211386245988;
