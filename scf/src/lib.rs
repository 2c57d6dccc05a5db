// Main library file for the native electronic-structure backend

pub mod ccsd_impl;
pub mod ci_impl;
pub mod error;
pub mod grad;
pub mod integrals;
pub mod mole;
pub mod mp2_impl;
pub mod optim_impl;
pub mod post;
pub mod scf_impl;
pub mod spin_orbital;

pub use error::ScfError;
pub use grad::{GradTarget, Gradients};
pub use mole::{BasisSpec, Cell, Mole};
pub use optim_impl::{GeomOptResult, GeometryOptimizer};
pub use post::{Method, PostMethod, PostSettings};
pub use scf_impl::{MeanField, Reference, ScfSettings};
