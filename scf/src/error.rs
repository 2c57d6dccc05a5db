use basis::BasisError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScfError {
    #[error(transparent)]
    Basis(#[from] BasisError),

    #[error("unknown element `{0}`")]
    UnknownElement(String),

    #[error("no basis set given for element `{0}`")]
    MissingBasis(String),

    #[error("cannot parse geometry: {0}")]
    Geometry(String),

    #[error("unknown unit `{0}`, expected angstrom or bohr")]
    Unit(String),

    #[error("{electrons} electrons are incompatible with spin {spin}")]
    Spin { electrons: i64, spin: i64 },

    #[error("{0} has not been built")]
    NotBuilt(&'static str),

    #[error("{0} has not been run")]
    NotRun(&'static str),

    #[error("active space of {norb} orbitals and {nelec} electrons does not fit the molecule: {reason}")]
    ActiveSpace {
        norb: usize,
        nelec: usize,
        reason: String,
    },

    #[error("CI space of {0} determinants is too large for the dense solver")]
    CiSpaceTooLarge(usize),

    #[error("{method} needs {what}")]
    Reference { method: String, what: String },

    #[error("not supported by the native backend: {0}")]
    Unsupported(String),

    #[error("linear algebra failure: {0}")]
    LinearAlgebra(String),
}
