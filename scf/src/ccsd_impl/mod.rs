//! CCSD (Coupled Cluster Singles and Doubles)
//!
//! |Ψ⟩ = exp(T₁ + T₂) |Φ₀⟩, solved in the spin-orbital basis with the
//! Stanton-Gauss intermediates. Works on top of restricted and
//! unrestricted references alike.

mod ccsd;

pub use ccsd::CCSD;

#[cfg(test)]
mod tests;
