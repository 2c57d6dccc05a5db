/* Contracted gaussian type orbital (CGTO),
   a fixed linear combination of the primitives in gto.rs
*/
#![allow(non_snake_case)]

use crate::basis::Basis;
use crate::gto::GTO;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractedGTO {
    pub primitives: Vec<GTO>,
    pub coefficients: Vec<f64>,
    // shell_type: 1s, 2s, 2px, 2py, 2pz, ...
    pub shell_type: String,
    pub l_xyz: Vector3<i32>,
    pub center: Vector3<f64>,
}

impl ContractedGTO {
    /// Builds a contraction and rescales the coefficients so that the
    /// contracted function has unit norm.
    pub fn new(
        shell_type: &str,
        exponents: &[f64],
        coefficients: &[f64],
        l_xyz: Vector3<i32>,
        center: Vector3<f64>,
    ) -> Self {
        let primitives = exponents
            .iter()
            .map(|&alpha| GTO::new(alpha, l_xyz, center))
            .collect();
        let mut cgto = Self {
            primitives,
            coefficients: coefficients.to_vec(),
            shell_type: shell_type.to_string(),
            l_xyz,
            center,
        };

        let self_overlap = ContractedGTO::Sab(&cgto, &cgto);
        if self_overlap > 0.0 {
            let scale = 1.0 / self_overlap.sqrt();
            cgto.coefficients.iter_mut().for_each(|c| *c *= scale);
        }
        cgto
    }

    pub fn set_center(&mut self, center: Vector3<f64>) {
        self.center = center;
        self.primitives
            .iter_mut()
            .for_each(|p| p.set_center(center));
    }

    pub fn angular_momentum(&self) -> i32 {
        self.l_xyz.x + self.l_xyz.y + self.l_xyz.z
    }

    fn pairs<'a>(
        a: &'a ContractedGTO,
        b: &'a ContractedGTO,
    ) -> impl Iterator<Item = (f64, &'a GTO, &'a GTO)> + 'a {
        a.coefficients
            .iter()
            .zip(a.primitives.iter())
            .flat_map(move |(ca, pa)| {
                b.coefficients
                    .iter()
                    .zip(b.primitives.iter())
                    .map(move |(cb, pb)| (ca * cb, pa, pb))
            })
    }
}

impl Basis for ContractedGTO {
    fn evaluate(&self, r: &Vector3<f64>) -> f64 {
        self.coefficients
            .iter()
            .zip(self.primitives.iter())
            .map(|(c, p)| c * p.evaluate(r))
            .sum()
    }

    fn center(&self) -> Vector3<f64> {
        self.center
    }

    fn Sab(a: &ContractedGTO, b: &ContractedGTO) -> f64 {
        ContractedGTO::pairs(a, b)
            .map(|(c, pa, pb)| c * GTO::Sab(pa, pb))
            .sum()
    }

    fn Tab(a: &ContractedGTO, b: &ContractedGTO) -> f64 {
        ContractedGTO::pairs(a, b)
            .map(|(c, pa, pb)| c * GTO::Tab(pa, pb))
            .sum()
    }

    fn Vab(a: &ContractedGTO, b: &ContractedGTO, R: Vector3<f64>, Z: u32) -> f64 {
        ContractedGTO::pairs(a, b)
            .map(|(c, pa, pb)| c * GTO::Vab(pa, pb, R, Z))
            .sum()
    }

    fn JKabcd(
        a: &ContractedGTO,
        b: &ContractedGTO,
        c: &ContractedGTO,
        d: &ContractedGTO,
    ) -> f64 {
        let cd: Vec<(f64, &GTO, &GTO)> = ContractedGTO::pairs(c, d).collect();
        ContractedGTO::pairs(a, b)
            .map(|(cab, pa, pb)| {
                cd.iter()
                    .map(|&(ccd, pc, pd)| ccd * GTO::JKabcd(pa, pb, pc, pd))
                    .sum::<f64>()
                    * cab
            })
            .sum()
    }

    fn Dab(a: &ContractedGTO, b: &ContractedGTO, origin: Vector3<f64>) -> Vector3<f64> {
        ContractedGTO::pairs(a, b)
            .map(|(c, pa, pb)| GTO::Dab(pa, pb, origin) * c)
            .fold(Vector3::zeros(), |acc, d| acc + d)
    }
}
