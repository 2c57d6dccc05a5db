//! Tests for MP2 implementation

use super::MP2;
use crate::mole::Mole;
use crate::scf_impl::MeanField;
use crate::spin_orbital::SpinOrbitalSystem;
use approx::assert_relative_eq;

fn converged(atom: &str, unit: &str, method: &str) -> MeanField {
    let mut mol = Mole::new();
    mol.atom = atom.to_string();
    mol.unit = unit.to_string();
    mol.build().unwrap();
    let mut mf = MeanField::new(method, mol).unwrap();
    mf.kernel().unwrap();
    mf
}

#[test]
fn test_mp2_h2_textbook() {
    let mf = converged("H 0 0 0; H 0 0 1.4", "bohr", "RHF");
    let e_corr = MP2::new(0).kernel(&mf).unwrap();
    assert!((e_corr + 0.0131).abs() < 5e-4, "got {}", e_corr);
}

#[test]
fn test_restricted_and_spin_orbital_forms_agree() {
    let mf = converged(
        "O 0 0 0; H 0 -0.757 0.587; H 0 0.757 0.587",
        "angstrom",
        "RHF",
    );
    let restricted = MP2::new(0).kernel(&mf).unwrap();
    let so = SpinOrbitalSystem::from_mean_field(&mf, 0).unwrap();
    assert_relative_eq!(restricted, MP2::spin_orbital(&so), epsilon = 1e-9);
    assert!(restricted < -0.03 && restricted > -0.06, "got {}", restricted);
}

#[test]
fn test_frozen_core_reduces_correlation() {
    let mf = converged(
        "O 0 0 0; H 0 -0.757 0.587; H 0 0.757 0.587",
        "angstrom",
        "RHF",
    );
    let all = MP2::new(0).kernel(&mf).unwrap();
    let frozen = MP2::new(1).kernel(&mf).unwrap();
    assert!(frozen > all);
    assert!(MP2::new(6).kernel(&mf).is_err());
}

#[test]
fn test_ump2_closed_shell_matches_rmp2() {
    let rhf = converged("H 0 0 0; H 0 0 1.4", "bohr", "RHF");
    let uhf = converged("H 0 0 0; H 0 0 1.4", "bohr", "UHF");
    assert_relative_eq!(
        MP2::new(0).kernel(&rhf).unwrap(),
        MP2::new(0).kernel(&uhf).unwrap(),
        epsilon = 1e-7
    );
}
