//! Configuration Interaction (CI) module
//!
//! The wave function is a linear combination of Slater determinants built
//! from alpha and beta occupation bitstrings. Matrix elements follow the
//! Slater-Condon rules and the dense Hamiltonian is diagonalised directly,
//! which bounds the determinant space.
//!
//! # Available Methods
//!
//! - **CISD**: singles and doubles out of the reference determinant
//! - **FCI**: every determinant of the (frozen-core) orbital space
//! - **CASCI**: FCI inside an active space on top of a doubly occupied core
//! - **CASSCF**: CASCI with variationally optimised orbitals
//! - **TDA**: single excitations for excited states (Tamm-Dancoff)
//!
//! # Usage
//!
//! ```rust,ignore
//! use scf::ci_impl::{CISolver, CiTarget};
//!
//! // after a converged mean-field calculation
//! let result = CISolver::default().kernel(&mf, CiTarget::Full)?;
//! println!("FCI correlation energy: {}", result.e_corr);
//! ```

mod active;
mod casci;
mod casscf;
mod ci;
mod determinant;
mod tda;
#[cfg(test)]
mod tests;

pub use active::ActiveHamiltonian;
pub use casci::{ActiveSpace, CASCI};
pub use casscf::CASSCF;
pub use ci::{CISolver, CiResult, CiTarget};
pub use determinant::{CiSpace, Determinant, MAX_DETERMINANTS};
pub use tda::TDA;
