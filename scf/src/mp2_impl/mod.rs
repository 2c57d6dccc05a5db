//! MP2 (Møller-Plesset perturbation theory, second order)
//!
//! For a restricted reference the closed-shell expression is used:
//!
//! E_MP2 = Σ_{ijab} (ia|jb) [2 (ia|jb) - (ib|ja)] / (ε_i + ε_j - ε_a - ε_b)
//!
//! For an unrestricted reference the spin-orbital form
//!
//! E_MP2 = 1/4 Σ_{ijab} |<ij||ab>|^2 / (ε_i + ε_j - ε_a - ε_b)
//!
//! is evaluated instead.

mod mp2;
#[cfg(test)]
mod tests;

pub use mp2::MP2;
