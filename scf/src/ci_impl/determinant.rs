//! Bitstring determinants and Slater-Condon matrix elements.

extern crate nalgebra as na;

use super::active::ActiveHamiltonian;
use crate::error::ScfError;
use crate::scf_impl::sorted_symmetric_eigen;
use itertools::Itertools;
use na::DMatrix;
use rayon::prelude::*;
use tracing::{debug, info};

/// Largest determinant space the dense solver accepts.
pub const MAX_DETERMINANTS: usize = 4000;

/// Largest active space a bitstring can hold.
pub(crate) const MAX_ORBITALS: usize = 64;

/// Occupations of the alpha and beta spin orbitals, bit `p` for orbital `p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Determinant {
    pub alpha: u64,
    pub beta: u64,
}

fn occupied(bits: u64) -> impl Iterator<Item = usize> {
    (0..MAX_ORBITALS).filter(move |&p| bits >> p & 1 == 1)
}

fn string_of(orbitals: impl IntoIterator<Item = usize>) -> u64 {
    orbitals.into_iter().fold(0, |acc, p| acc | 1 << p)
}

/// Phase of a_to^† a_from acting on `bits`: the parity of the occupied
/// orbitals strictly between the two.
fn excitation_sign(bits: u64, from: usize, to: usize) -> f64 {
    let (lo, hi) = if from < to { (from, to) } else { (to, from) };
    let between = ((1u64 << hi) - 1) & !((1u64 << (lo + 1)) - 1);
    if (bits & between).count_ones() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// All strings with up to two holes in the lowest `nelec` orbitals.
fn strings_up_to_doubles(norb: usize, nelec: usize) -> Vec<u64> {
    let reference = string_of(0..nelec);
    let mut strings = vec![reference];
    for level in 1..=2 {
        for holes in (0..nelec).combinations(level) {
            for particles in (nelec..norb).combinations(level) {
                strings.push(reference ^ string_of(holes.iter().copied()) ^ string_of(particles));
            }
        }
    }
    strings
}

fn excitation_level(bits: u64, nelec: usize) -> u32 {
    (bits ^ string_of(0..nelec)).count_ones() / 2
}

/// A determinant basis of fixed particle numbers.
#[derive(Debug, Clone)]
pub struct CiSpace {
    pub norb: usize,
    pub nalpha: usize,
    pub nbeta: usize,
    pub dets: Vec<Determinant>,
}

impl CiSpace {
    fn check(norb: usize, nalpha: usize, nbeta: usize) -> Result<(), ScfError> {
        if norb > MAX_ORBITALS {
            return Err(ScfError::ActiveSpace {
                norb,
                nelec: nalpha + nbeta,
                reason: format!("at most {} orbitals are supported", MAX_ORBITALS),
            });
        }
        if nalpha > norb || nbeta > norb {
            return Err(ScfError::ActiveSpace {
                norb,
                nelec: nalpha + nbeta,
                reason: "more electrons of one spin than orbitals".to_string(),
            });
        }
        Ok(())
    }

    /// Every distribution of the electrons over `norb` orbitals.
    pub fn full(norb: usize, nalpha: usize, nbeta: usize) -> Result<Self, ScfError> {
        Self::check(norb, nalpha, nbeta)?;
        let alpha: Vec<u64> = (0..norb).combinations(nalpha).map(string_of).collect();
        let beta: Vec<u64> = (0..norb).combinations(nbeta).map(string_of).collect();
        let dets = alpha
            .iter()
            .cartesian_product(beta.iter())
            .map(|(&a, &b)| Determinant { alpha: a, beta: b })
            .collect();
        Ok(CiSpace {
            norb,
            nalpha,
            nbeta,
            dets,
        })
    }

    /// The reference (lowest orbitals filled) with its single and double
    /// excitations.
    pub fn singles_doubles(norb: usize, nalpha: usize, nbeta: usize) -> Result<Self, ScfError> {
        Self::check(norb, nalpha, nbeta)?;
        let alpha = strings_up_to_doubles(norb, nalpha);
        let beta = strings_up_to_doubles(norb, nbeta);
        let dets = alpha
            .iter()
            .cartesian_product(beta.iter())
            .filter(|&(&a, &b)| excitation_level(a, nalpha) + excitation_level(b, nbeta) <= 2)
            .map(|(&a, &b)| Determinant { alpha: a, beta: b })
            .collect();
        Ok(CiSpace {
            norb,
            nalpha,
            nbeta,
            dets,
        })
    }

    pub fn len(&self) -> usize {
        self.dets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dets.is_empty()
    }
}

impl ActiveHamiltonian {
    fn diagonal(&self, det: &Determinant) -> f64 {
        let strings = [det.alpha, det.beta];
        let mut e = 0.0;
        for spin in 0..2 {
            let eri = self.same_spin(spin);
            for i in occupied(strings[spin]) {
                e += self.h1[spin][(i, i)];
                for j in occupied(strings[spin]) {
                    e += 0.5 * (eri.get(i, i, j, j) - eri.get(i, j, j, i));
                }
            }
        }
        for i in occupied(det.alpha) {
            for j in occupied(det.beta) {
                e += self.eri[1].get(i, i, j, j);
            }
        }
        e
    }

    fn single(&self, spin: usize, ket: u64, other: u64, bra: u64) -> f64 {
        let i = (ket & !bra).trailing_zeros() as usize;
        let a = (bra & !ket).trailing_zeros() as usize;
        let eri = self.same_spin(spin);
        let mut v = self.h1[spin][(i, a)];
        for k in occupied(ket) {
            v += eri.get(i, a, k, k) - eri.get(i, k, k, a);
        }
        for k in occupied(other) {
            v += self.cross(spin, i, a, k, k);
        }
        excitation_sign(ket, i, a) * v
    }

    fn same_spin_double(&self, spin: usize, ket: u64, bra: u64) -> f64 {
        let holes = ket & !bra;
        let particles = bra & !ket;
        let i = holes.trailing_zeros() as usize;
        let j = (63 - holes.leading_zeros()) as usize;
        let a = particles.trailing_zeros() as usize;
        let b = (63 - particles.leading_zeros()) as usize;
        let s1 = excitation_sign(ket, i, a);
        let s2 = excitation_sign(ket ^ (1 << i) ^ (1 << a), j, b);
        let eri = self.same_spin(spin);
        s1 * s2 * (eri.get(i, a, j, b) - eri.get(i, b, j, a))
    }

    fn opposite_spin_double(&self, ket: &Determinant, bra: &Determinant) -> f64 {
        let i = (ket.alpha & !bra.alpha).trailing_zeros() as usize;
        let a = (bra.alpha & !ket.alpha).trailing_zeros() as usize;
        let j = (ket.beta & !bra.beta).trailing_zeros() as usize;
        let b = (bra.beta & !ket.beta).trailing_zeros() as usize;
        excitation_sign(ket.alpha, i, a)
            * excitation_sign(ket.beta, j, b)
            * self.eri[1].get(i, a, j, b)
    }

    /// <bra|H|ket> without the core energy.
    pub fn matrix_element(&self, bra: &Determinant, ket: &Determinant) -> f64 {
        let da = (bra.alpha ^ ket.alpha).count_ones() / 2;
        let db = (bra.beta ^ ket.beta).count_ones() / 2;
        match (da, db) {
            (0, 0) => self.diagonal(ket),
            (1, 0) => self.single(0, ket.alpha, ket.beta, bra.alpha),
            (0, 1) => self.single(1, ket.beta, ket.alpha, bra.beta),
            (2, 0) => self.same_spin_double(0, ket.alpha, bra.alpha),
            (0, 2) => self.same_spin_double(1, ket.beta, bra.beta),
            (1, 1) => self.opposite_spin_double(ket, bra),
            _ => 0.0,
        }
    }

    /// Dense Hamiltonian over `space`, rows evaluated in parallel.
    pub fn hamiltonian(&self, space: &CiSpace, max_determinants: usize) -> Result<DMatrix<f64>, ScfError> {
        let n = space.len();
        if n > max_determinants {
            return Err(ScfError::CiSpaceTooLarge(n));
        }
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..=i)
                    .map(|j| self.matrix_element(&space.dets[i], &space.dets[j]))
                    .collect()
            })
            .collect();
        let mut h = DMatrix::zeros(n, n);
        for (i, row) in rows.into_iter().enumerate() {
            for (j, v) in row.into_iter().enumerate() {
                h[(i, j)] = v;
                h[(j, i)] = v;
            }
        }
        Ok(h)
    }

    /// Lowest `nroots` total energies and their CI vectors (columns).
    pub fn diagonalize(
        &self,
        space: &CiSpace,
        nroots: usize,
        max_determinants: usize,
    ) -> Result<(Vec<f64>, DMatrix<f64>), ScfError> {
        if space.is_empty() {
            return Err(ScfError::ActiveSpace {
                norb: space.norb,
                nelec: space.nalpha + space.nbeta,
                reason: "no determinants".to_string(),
            });
        }
        info!(
            "CI space: {} orbitals, ({}, {}) electrons, {} determinants",
            space.norb,
            space.nalpha,
            space.nbeta,
            space.len()
        );
        let h = self.hamiltonian(space, max_determinants)?;
        let (values, vectors) = sorted_symmetric_eigen(h);
        let nroots = nroots.clamp(1, space.len());
        let energies: Vec<f64> = values
            .iter()
            .take(nroots)
            .map(|e| e + self.e_core)
            .collect();
        for (k, e) in energies.iter().enumerate() {
            debug!("  root {:2}: E = {:.12}", k, e);
        }
        Ok((energies, vectors.columns(0, nroots).into_owned()))
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_excitation_sign_counts_between() {
        // orbitals 0, 1, 2 occupied; 0 -> 3 passes 1 and 2
        assert_eq!(excitation_sign(0b0111, 0, 3), 1.0);
        // 1 -> 3 passes 2
        assert_eq!(excitation_sign(0b0111, 1, 3), -1.0);
        assert_eq!(excitation_sign(0b0111, 2, 3), 1.0);
    }

    #[test]
    fn test_space_sizes() {
        assert_eq!(CiSpace::full(4, 2, 2).unwrap().len(), 36);
        assert_eq!(CiSpace::full(2, 1, 1).unwrap().len(), 4);
        // 5 occupied, 2 virtual per spin: reference, 20 singles, 120 doubles
        let sd = CiSpace::singles_doubles(7, 5, 5).unwrap();
        assert_eq!(sd.len(), 1 + 20 + 10 + 10 + 100);
    }

    #[test]
    fn test_too_many_electrons() {
        assert!(CiSpace::full(2, 3, 0).is_err());
    }
}
