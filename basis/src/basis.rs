#![allow(non_snake_case)]
use nalgebra::Vector3;

/// One- and two-electron integrals over a single Cartesian basis function.
///
/// All integrals are in atomic units, `Vab` includes the `-Z` prefactor of
/// the nuclear attraction and `Dab` is the first moment `<a|r - origin|b>`.
pub trait Basis {
    fn evaluate(&self, r: &Vector3<f64>) -> f64;
    fn center(&self) -> Vector3<f64>;
    fn Sab(a: &Self, b: &Self) -> f64;
    fn Tab(a: &Self, b: &Self) -> f64;
    fn Vab(a: &Self, b: &Self, R: Vector3<f64>, Z: u32) -> f64;
    fn JKabcd(a: &Self, b: &Self, c: &Self, d: &Self) -> f64;
    fn Dab(a: &Self, b: &Self, origin: Vector3<f64>) -> Vector3<f64>;
}
