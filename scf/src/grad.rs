//! Nuclear gradients by central finite differences of the method energy.

extern crate nalgebra as na;

use crate::error::ScfError;
use crate::mole::Mole;
use crate::post::PostMethod;
use crate::scf_impl::MeanField;
use na::{DMatrix, Vector3};
use rayon::prelude::*;
use tracing::info;

/// Displacement in bohr.
pub const DEFAULT_STEP: f64 = 1e-4;

/// The method whose energy is differentiated.
#[derive(Debug, Clone)]
pub enum GradTarget {
    MeanField(MeanField),
    Post(PostMethod),
}

impl GradTarget {
    pub fn mol(&self) -> &Mole {
        match self {
            GradTarget::MeanField(mf) => &mf.mol,
            GradTarget::Post(post) => &post.base.mol,
        }
    }

    /// Runs a fresh copy of the method at `coords` (bohr).
    pub fn energy_at(&self, coords: &[Vector3<f64>]) -> Result<f64, ScfError> {
        match self {
            GradTarget::MeanField(mf) => mf.at_geometry(coords)?.kernel(),
            GradTarget::Post(post) => post.at_geometry(coords)?.kernel(),
        }
    }

    /// natm x 3 gradient in Eh/bohr at `coords`.
    pub fn gradient_at(&self, coords: &[Vector3<f64>], step: f64) -> Result<DMatrix<f64>, ScfError> {
        let natm = coords.len();
        let components: Vec<f64> = (0..natm * 3)
            .into_par_iter()
            .map(|k| {
                let (atom, axis) = (k / 3, k % 3);
                let mut plus = coords.to_vec();
                plus[atom][axis] += step;
                let mut minus = coords.to_vec();
                minus[atom][axis] -= step;
                Ok((self.energy_at(&plus)? - self.energy_at(&minus)?) / (2.0 * step))
            })
            .collect::<Result<_, ScfError>>()?;
        Ok(DMatrix::from_row_slice(natm, 3, &components))
    }
}

#[derive(Debug, Clone)]
pub struct Gradients {
    pub target: GradTarget,
    pub step: f64,
    de: Option<DMatrix<f64>>,
}

impl Gradients {
    pub fn new(target: GradTarget) -> Self {
        Gradients {
            target,
            step: DEFAULT_STEP,
            de: None,
        }
    }

    pub fn mol(&self) -> &Mole {
        self.target.mol()
    }

    pub fn kernel(&mut self) -> Result<DMatrix<f64>, ScfError> {
        let mol = self.target.mol();
        info!("#####################################################");
        info!("  Nuclear gradients (finite differences, step {:.1e} bohr)", self.step);
        info!("#####################################################");
        let de = self.target.gradient_at(&mol.coords(), self.step)?;
        for i in 0..de.nrows() {
            info!(
                "  {:3} {:2} [{:14.8}, {:14.8}, {:14.8}]",
                i,
                mol.atom_symbol(i).unwrap_or("?"),
                de[(i, 0)],
                de[(i, 1)],
                de[(i, 2)]
            );
        }
        self.de = Some(de.clone());
        Ok(de)
    }

    /// The gradient of the last `kernel` call.
    pub fn de(&self) -> Result<&DMatrix<f64>, ScfError> {
        self.de.as_ref().ok_or(ScfError::NotRun("Gradients"))
    }
}
