use super::CCSD;
use crate::ci_impl::{CISolver, CiTarget};
use crate::mole::Mole;
use crate::scf_impl::MeanField;

fn h2_rhf(method: &str) -> MeanField {
    let mut mol = Mole::new();
    mol.atom = "H 0 0 0; H 0 0 1.4".to_string();
    mol.unit = "bohr".to_string();
    mol.build().unwrap();
    let mut mf = MeanField::new(method, mol).unwrap();
    mf.kernel().unwrap();
    mf
}

#[test]
fn test_ccsd_is_exact_for_two_electrons() {
    let mf = h2_rhf("RHF");
    let mut cc = CCSD::default();
    let e_cc = cc.kernel(&mf).unwrap();
    assert!(cc.converged);
    let e_fci = CISolver::default()
        .kernel(&mf, CiTarget::Full)
        .unwrap()
        .e_corr;
    assert!((e_cc - e_fci).abs() < 1e-6, "{} vs {}", e_cc, e_fci);
    assert!((e_cc + 0.0206).abs() < 1e-3);
}

#[test]
fn test_ccsd_on_unrestricted_reference() {
    let rhf = h2_rhf("RHF");
    let uhf = h2_rhf("UHF");
    let e_r = CCSD::default().kernel(&rhf).unwrap();
    let e_u = CCSD::default().kernel(&uhf).unwrap();
    assert!((e_r - e_u).abs() < 1e-6);
}

#[test]
fn test_ccsd_water_between_mp2_and_zero() {
    let mut mol = Mole::new();
    mol.atom = "O 0 0 0; H 0 -0.757 0.587; H 0 0.757 0.587".to_string();
    mol.build().unwrap();
    let mut mf = MeanField::new("RHF", mol).unwrap();
    mf.kernel().unwrap();
    let mut cc = CCSD::new(1);
    let e = cc.kernel(&mf).unwrap();
    assert!(cc.converged);
    assert!(e < -0.02 && e > -0.08, "got {}", e);
}
