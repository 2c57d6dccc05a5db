//! Antisymmetrised spin-orbital integrals over canonical HF orbitals.

extern crate nalgebra as na;

use crate::error::ScfError;
use crate::integrals::Tensor4;
use crate::scf_impl::MeanField;
use na::DMatrix;

/// Spin orbitals ordered occupied first (alpha then beta), then virtual
/// (alpha then beta). `frozen` lowest spatial orbitals of each spin are
/// dropped.
#[derive(Debug, Clone)]
pub struct SpinOrbitalSystem {
    pub nocc: usize,
    pub nvirt: usize,
    pub eps: Vec<f64>,
    /// 0 for alpha, 1 for beta
    pub spin: Vec<usize>,
    /// <pq||rs>
    pub g: Tensor4,
}

impl SpinOrbitalSystem {
    pub fn nso(&self) -> usize {
        self.nocc + self.nvirt
    }

    pub fn from_mean_field(mf: &MeanField, frozen: usize) -> Result<Self, ScfError> {
        let solution = mf.solution()?;
        let ints = mf.integrals()?;
        let (nalpha, nbeta) = mf.mol.nelec();
        if frozen > nbeta {
            return Err(ScfError::Reference {
                method: "correlated method".to_string(),
                what: format!("at most {} frozen orbitals, got {}", nbeta, frozen),
            });
        }
        let alpha = &solution.orbitals[0];
        let beta = solution.orbitals.get(1).unwrap_or(alpha);
        let nmo = alpha.mo_energy.len();

        // (spin, orbital index) in the final order
        let mut labels: Vec<(usize, usize)> = Vec::new();
        labels.extend((frozen..nalpha).map(|p| (0, p)));
        labels.extend((frozen..nbeta).map(|p| (1, p)));
        let nocc = labels.len();
        labels.extend((nalpha..nmo).map(|p| (0, p)));
        labels.extend((nbeta..nmo).map(|p| (1, p)));
        let nso = labels.len();

        let channels = [alpha, beta];
        let nao = alpha.mo_coeff.nrows();
        let c = DMatrix::from_fn(nao, nso, |mu, k| {
            let (spin, p) = labels[k];
            channels[spin].mo_coeff[(mu, p)]
        });
        let eps: Vec<f64> = labels
            .iter()
            .map(|&(spin, p)| channels[spin].mo_energy[p])
            .collect();

        // (pr|qs) over all spin orbital labels, spin selection below
        let mo = ints.eri.transform([&c, &c, &c, &c]);
        let spin = |k: usize| labels[k].0;
        let mut g = Tensor4::zeros([nso, nso, nso, nso]);
        for p in 0..nso {
            for q in 0..nso {
                for r in 0..nso {
                    for s in 0..nso {
                        let direct = if spin(p) == spin(r) && spin(q) == spin(s) {
                            mo.get(p, r, q, s)
                        } else {
                            0.0
                        };
                        let exchange = if spin(p) == spin(s) && spin(q) == spin(r) {
                            mo.get(p, s, q, r)
                        } else {
                            0.0
                        };
                        g.set(p, q, r, s, direct - exchange);
                    }
                }
            }
        }

        Ok(SpinOrbitalSystem {
            nocc,
            nvirt: nso - nocc,
            eps,
            spin: labels.iter().map(|&(spin, _)| spin).collect(),
            g,
        })
    }
}
