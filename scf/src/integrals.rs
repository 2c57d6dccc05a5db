//! AO integrals and four-index transformations.

extern crate nalgebra as na;

use crate::mole::Mole;
use basis::{Basis, ContractedGTO};
use na::{DMatrix, Vector3};
use rayon::prelude::*;
use tracing::info;

/// Dense four-index array in chemists' notation, `(pq|rs)`.
#[derive(Debug, Clone)]
pub struct Tensor4 {
    dims: [usize; 4],
    data: Vec<f64>,
}

impl Tensor4 {
    pub fn zeros(dims: [usize; 4]) -> Self {
        Tensor4 {
            dims,
            data: vec![0.0; dims.iter().product()],
        }
    }

    pub fn dims(&self) -> [usize; 4] {
        self.dims
    }

    #[inline]
    fn index(&self, p: usize, q: usize, r: usize, s: usize) -> usize {
        ((p * self.dims[1] + q) * self.dims[2] + r) * self.dims[3] + s
    }

    #[inline]
    pub fn get(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        self.data[self.index(p, q, r, s)]
    }

    #[inline]
    pub fn set(&mut self, p: usize, q: usize, r: usize, s: usize, value: f64) {
        let idx = self.index(p, q, r, s);
        self.data[idx] = value;
    }

    /// Transforms every index with its own coefficient matrix, one quarter
    /// at a time: `(pq|rs) = sum C1[mp] C2[nq] C3[lr] C4[ks] (mn|lk)`.
    pub fn transform(&self, c: [&DMatrix<f64>; 4]) -> Tensor4 {
        let mut t = self.clone();
        for axis in 0..4 {
            t = t.transform_axis(axis, c[axis]);
        }
        t
    }

    fn transform_axis(&self, axis: usize, c: &DMatrix<f64>) -> Tensor4 {
        let mut dims = self.dims;
        dims[axis] = c.ncols();
        let n_old = self.dims[axis];
        let len: usize = dims.iter().product();
        let data: Vec<f64> = (0..len)
            .into_par_iter()
            .with_min_len(256)
            .map(|flat| {
                let mut idx = [0usize; 4];
                let mut rest = flat;
                for k in (0..4).rev() {
                    idx[k] = rest % dims[k];
                    rest /= dims[k];
                }
                let p = idx[axis];
                let mut v = 0.0;
                for m in 0..n_old {
                    let coef = c[(m, p)];
                    if coef == 0.0 {
                        continue;
                    }
                    idx[axis] = m;
                    v += coef * self.get(idx[0], idx[1], idx[2], idx[3]);
                }
                v
            })
            .collect();
        Tensor4 { dims, data }
    }
}

/// One- and two-electron AO integrals of a built molecule.
#[derive(Debug, Clone)]
pub struct Integrals {
    pub overlap: DMatrix<f64>,
    pub kinetic: DMatrix<f64>,
    pub nuclear: DMatrix<f64>,
    pub hcore: DMatrix<f64>,
    pub dipole: [DMatrix<f64>; 3],
    pub eri: Tensor4,
    pub e_nuc: f64,
}

fn one_electron<F>(ao: &[ContractedGTO], f: F) -> DMatrix<f64>
where
    F: Fn(&ContractedGTO, &ContractedGTO) -> f64 + Sync,
{
    let n = ao.len();
    let ij_pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (0..=i).map(move |j| (i, j)))
        .collect();
    let values: Vec<f64> = ij_pairs
        .par_iter()
        .map(|&(i, j)| f(&ao[i], &ao[j]))
        .collect();
    let mut m = DMatrix::zeros(n, n);
    for (&(i, j), v) in ij_pairs.iter().zip(values) {
        m[(i, j)] = v;
        m[(j, i)] = v;
    }
    m
}

fn electron_repulsion(ao: &[ContractedGTO]) -> Tensor4 {
    let n = ao.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (0..=i).map(move |j| (i, j)))
        .collect();
    let quartets: Vec<(usize, usize)> = (0..pairs.len())
        .flat_map(|ij| (0..=ij).map(move |kl| (ij, kl)))
        .collect();

    let values: Vec<f64> = quartets
        .par_iter()
        .map(|&(ij, kl)| {
            let (i, j) = pairs[ij];
            let (k, l) = pairs[kl];
            ContractedGTO::JKabcd(&ao[i], &ao[j], &ao[k], &ao[l])
        })
        .collect();

    let mut eri = Tensor4::zeros([n, n, n, n]);
    for (&(ij, kl), v) in quartets.iter().zip(values) {
        let (i, j) = pairs[ij];
        let (k, l) = pairs[kl];
        for &(a, b) in &[(i, j), (j, i)] {
            for &(c, d) in &[(k, l), (l, k)] {
                eri.set(a, b, c, d, v);
                eri.set(c, d, a, b, v);
            }
        }
    }
    eri
}

impl Integrals {
    pub fn compute(mol: &Mole) -> Self {
        let ao = mol.ao();
        info!("computing AO integrals for {} basis functions", ao.len());

        let overlap = one_electron(ao, |a, b| ContractedGTO::Sab(a, b));
        let kinetic = one_electron(ao, |a, b| ContractedGTO::Tab(a, b));
        let nuclear = one_electron(ao, |a, b| {
            mol.atoms()
                .iter()
                .map(|atom| ContractedGTO::Vab(a, b, atom.coord, atom.charge))
                .sum()
        });
        let hcore = &kinetic + &nuclear;
        let dipole = [0, 1, 2].map(|k| {
            one_electron(ao, |a, b| ContractedGTO::Dab(a, b, Vector3::zeros())[k])
        });
        let eri = electron_repulsion(ao);

        Integrals {
            overlap,
            kinetic,
            nuclear,
            hcore,
            dipole,
            eri,
            e_nuc: mol.energy_nuc(),
        }
    }

    pub fn nao(&self) -> usize {
        self.overlap.nrows()
    }

    /// Coulomb and exchange matrices of a density matrix.
    pub fn jk(&self, density: &DMatrix<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        let n = self.nao();
        let ij_pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .collect();
        let values: Vec<(f64, f64)> = ij_pairs
            .par_iter()
            .map(|&(i, j)| {
                let mut coulomb = 0.0;
                let mut exchange = 0.0;
                for k in 0..n {
                    for l in 0..n {
                        let d = density[(k, l)];
                        coulomb += d * self.eri.get(i, j, k, l);
                        exchange += d * self.eri.get(i, k, j, l);
                    }
                }
                (coulomb, exchange)
            })
            .collect();
        let mut j = DMatrix::zeros(n, n);
        let mut k = DMatrix::zeros(n, n);
        for (&(a, b), (cv, xv)) in ij_pairs.iter().zip(values) {
            j[(a, b)] = cv;
            k[(a, b)] = xv;
        }
        (j, k)
    }
}
