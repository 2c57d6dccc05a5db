//! Active-space Hamiltonian with the core folded into an effective
//! one-electron operator.

extern crate nalgebra as na;

use crate::integrals::{Integrals, Tensor4};
use na::DMatrix;

/// Integrals over `norb` active orbitals per spin channel.
#[derive(Debug, Clone)]
pub struct ActiveHamiltonian {
    pub norb: usize,
    /// Effective one-electron integrals, alpha then beta.
    pub h1: [DMatrix<f64>; 2],
    /// (aa|aa), (aa|bb) and (bb|bb) in chemists' notation.
    pub eri: [Tensor4; 3],
    /// Nuclear repulsion plus the energy of the frozen core.
    pub e_core: f64,
}

impl ActiveHamiltonian {
    /// `mo` holds the alpha and beta orbital coefficients; the first `ncore`
    /// columns are doubly occupied and the next `norb` are active.
    pub fn new(ints: &Integrals, mo: [&DMatrix<f64>; 2], ncore: usize, norb: usize) -> Self {
        let core_density = |c: &DMatrix<f64>| {
            let occ = c.columns(0, ncore);
            occ * occ.transpose()
        };
        let density = [core_density(mo[0]), core_density(mo[1])];
        let (coulomb, _) = ints.jk(&(&density[0] + &density[1]));

        let mut e_core = ints.e_nuc;
        let mut h1 = [DMatrix::zeros(norb, norb), DMatrix::zeros(norb, norb)];
        let active: Vec<DMatrix<f64>> = mo
            .iter()
            .map(|c| c.columns(ncore, norb).into_owned())
            .collect();
        for spin in 0..2 {
            let (_, exchange) = ints.jk(&density[spin]);
            let fock = &ints.hcore + &coulomb - exchange;
            e_core += 0.5 * density[spin].dot(&(&ints.hcore + &fock));
            h1[spin] = active[spin].transpose() * fock * &active[spin];
        }

        let (ca, cb) = (&active[0], &active[1]);
        let eri = [
            ints.eri.transform([ca, ca, ca, ca]),
            ints.eri.transform([ca, ca, cb, cb]),
            ints.eri.transform([cb, cb, cb, cb]),
        ];

        ActiveHamiltonian {
            norb,
            h1,
            eri,
            e_core,
        }
    }

    /// Same-spin integrals of one channel.
    pub(crate) fn same_spin(&self, spin: usize) -> &Tensor4 {
        if spin == 0 {
            &self.eri[0]
        } else {
            &self.eri[2]
        }
    }

    /// (pq|rs) with pq in channel `spin` and rs in the other one.
    pub(crate) fn cross(&self, spin: usize, p: usize, q: usize, r: usize, s: usize) -> f64 {
        if spin == 0 {
            self.eri[1].get(p, q, r, s)
        } else {
            self.eri[1].get(r, s, p, q)
        }
    }
}
