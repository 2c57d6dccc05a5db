pub mod basis;
pub mod cgto;
pub mod error;
pub mod gto;
pub mod helper;
pub mod library;

mod gto_test;

pub use crate::basis::Basis;
pub use crate::cgto::ContractedGTO;
pub use crate::error::BasisError;
pub use crate::gto::GTO;
pub use crate::library::BasisSetName;
