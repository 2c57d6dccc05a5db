//! Built-in basis set library.
//!
//! STO-3G is generated from the universal least-squares fit of a 1s and a
//! 2sp Slater function by three Gaussians, scaled with the standard
//! molecular Slater exponents of each element.

use crate::cgto::ContractedGTO;
use crate::error::BasisError;
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use std::str::FromStr;

const STO3G_1S_EXPONENTS: [f64; 3] = [2.227660584, 0.4057711562, 0.1098175104];
const STO3G_1S_COEFFICIENTS: [f64; 3] = [0.1543289673, 0.5353281423, 0.4446345422];
const STO3G_2SP_EXPONENTS: [f64; 3] = [0.9942027910, 0.2310313333, 0.07513856000];
const STO3G_2S_COEFFICIENTS: [f64; 3] = [-0.09996722919, 0.3995128261, 0.7001154689];
const STO3G_2P_COEFFICIENTS: [f64; 3] = [0.1559162750, 0.6076837186, 0.3919573931];

// (zeta_1s, zeta_2sp) for H..Ne
const STO3G_ZETA: [(f64, f64); 10] = [
    (1.24, 0.0),
    (1.69, 0.0),
    (2.69, 0.80),
    (3.68, 1.15),
    (4.68, 1.50),
    (5.67, 1.72),
    (6.67, 1.95),
    (7.66, 2.25),
    (8.65, 2.55),
    (9.64, 2.88),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisSetName {
    Sto3g,
}

impl FromStr for BasisSetName {
    type Err = BasisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "sto3g" => Ok(BasisSetName::Sto3g),
            _ => Err(BasisError::UnknownBasis(s.to_string())),
        }
    }
}

impl BasisSetName {
    pub fn as_str(&self) -> &'static str {
        match self {
            BasisSetName::Sto3g => "sto-3g",
        }
    }

    /// Contracted functions of one atom placed at `center` (bohr).
    pub fn atom_basis(
        &self,
        element: &Element,
        center: Vector3<f64>,
    ) -> Result<Vec<ContractedGTO>, BasisError> {
        match self {
            BasisSetName::Sto3g => sto3g_atom(element, center),
        }
    }
}

fn scaled(exponents: &[f64; 3], zeta: f64) -> Vec<f64> {
    exponents.iter().map(|a| a * zeta * zeta).collect()
}

fn sto3g_atom(element: &Element, center: Vector3<f64>) -> Result<Vec<ContractedGTO>, BasisError> {
    let z = element.get_atomic_number() as usize;
    if z == 0 || z > STO3G_ZETA.len() {
        return Err(BasisError::MissingElement {
            basis: BasisSetName::Sto3g.as_str().to_string(),
            symbol: element.get_symbol().to_string(),
        });
    }
    let (zeta_1s, zeta_2sp) = STO3G_ZETA[z - 1];

    let mut functions = vec![ContractedGTO::new(
        "1s",
        &scaled(&STO3G_1S_EXPONENTS, zeta_1s),
        &STO3G_1S_COEFFICIENTS,
        Vector3::new(0, 0, 0),
        center,
    )];

    if z > 2 {
        let exponents = scaled(&STO3G_2SP_EXPONENTS, zeta_2sp);
        functions.push(ContractedGTO::new(
            "2s",
            &exponents,
            &STO3G_2S_COEFFICIENTS,
            Vector3::new(0, 0, 0),
            center,
        ));
        for (label, l_xyz) in [
            ("2px", Vector3::new(1, 0, 0)),
            ("2py", Vector3::new(0, 1, 0)),
            ("2pz", Vector3::new(0, 0, 1)),
        ] {
            functions.push(ContractedGTO::new(
                label,
                &exponents,
                &STO3G_2P_COEFFICIENTS,
                l_xyz,
                center,
            ));
        }
    }

    Ok(functions)
}
