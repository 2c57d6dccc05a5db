use super::*;
use crate::error::ScfError;
use crate::mole::Mole;
use crate::scf_impl::MeanField;
use approx::assert_relative_eq;

fn run(atom: &str, unit: &str, spin: i64, method: &str) -> MeanField {
    let mut mol = Mole::new();
    mol.atom = atom.to_string();
    mol.unit = unit.to_string();
    mol.spin = spin;
    mol.build().unwrap();
    let mut mf = MeanField::new(method, mol).unwrap();
    mf.kernel().unwrap();
    mf
}

fn h2() -> MeanField {
    run("H 0 0 0; H 0 0 1.4", "bohr", 0, "RHF")
}

fn lih() -> MeanField {
    run("Li 0 0 0; H 0 0 1.6", "angstrom", 0, "RHF")
}

#[test]
fn test_fci_h2_textbook() {
    let mf = h2();
    let result = CISolver::default().kernel(&mf, CiTarget::Full).unwrap();
    assert_eq!(result.ndet, 4);
    assert!((result.e_corr + 0.0206).abs() < 1e-3, "got {}", result.e_corr);
    assert_relative_eq!(result.ci.norm(), 1.0, epsilon = 1e-10);
}

#[test]
fn test_cisd_equals_fci_for_two_electrons() {
    let mf = h2();
    let cisd = CISolver::default().kernel(&mf, CiTarget::SinglesDoubles).unwrap();
    let fci = CISolver::default().kernel(&mf, CiTarget::Full).unwrap();
    assert_relative_eq!(cisd.e_tot[0], fci.e_tot[0], epsilon = 1e-10);
}

#[test]
fn test_reference_determinant_energy() {
    // the diagonal element of the reference must reproduce the HF energy
    let mf = lih();
    let solution = mf.solution().unwrap();
    let c = &solution.orbitals[0].mo_coeff;
    let nmo = c.ncols();
    let ham = ActiveHamiltonian::new(mf.integrals().unwrap(), [c, c], 0, nmo);
    let reference = Determinant {
        alpha: 0b11,
        beta: 0b11,
    };
    let e = ham.matrix_element(&reference, &reference) + ham.e_core;
    assert_relative_eq!(e, solution.e_tot, epsilon = 1e-8);

    // folding the core into e_core leaves the energy unchanged
    let folded = ActiveHamiltonian::new(mf.integrals().unwrap(), [c, c], 1, nmo - 1);
    let reference = Determinant { alpha: 1, beta: 1 };
    let e = folded.matrix_element(&reference, &reference) + folded.e_core;
    assert_relative_eq!(e, solution.e_tot, epsilon = 1e-8);
}

#[test]
fn test_brillouin_singles_vanish() {
    let mf = lih();
    let c = &mf.solution().unwrap().orbitals[0].mo_coeff;
    let nmo = c.ncols();
    let ham = ActiveHamiltonian::new(mf.integrals().unwrap(), [c, c], 0, nmo);
    let reference = Determinant {
        alpha: 0b11,
        beta: 0b11,
    };
    let single = Determinant {
        alpha: 0b101,
        beta: 0b11,
    };
    assert!(ham.matrix_element(&single, &reference).abs() < 1e-4);
}

#[test]
fn test_hamiltonian_is_symmetric() {
    let mf = lih();
    let c = &mf.solution().unwrap().orbitals[0].mo_coeff;
    let ham = ActiveHamiltonian::new(mf.integrals().unwrap(), [c, c], 1, 4);
    let space = CiSpace::full(4, 1, 1).unwrap();
    let h = ham.hamiltonian(&space, MAX_DETERMINANTS).unwrap();
    assert!((&h - h.transpose()).norm() < 1e-12);
}

#[test]
fn test_variational_ordering() {
    let mf = lih();
    let cisd = CISolver::default().kernel(&mf, CiTarget::SinglesDoubles).unwrap();
    let fci = CISolver::default().kernel(&mf, CiTarget::Full).unwrap();
    assert!(cisd.e_tot[0] < mf.e_tot().unwrap());
    assert!(fci.e_tot[0] <= cisd.e_tot[0] + 1e-10);
}

#[test]
fn test_frozen_core_raises_energy() {
    let mf = lih();
    let all = CISolver::default().kernel(&mf, CiTarget::Full).unwrap();
    let frozen = CISolver {
        frozen: 1,
        ..Default::default()
    }
    .kernel(&mf, CiTarget::Full)
    .unwrap();
    assert!(frozen.e_tot[0] >= all.e_tot[0] - 1e-10);
    assert!(frozen.e_corr < 0.0);
}

#[test]
fn test_space_too_large() {
    let mf = lih();
    let solver = CISolver {
        max_determinants: 10,
        ..Default::default()
    };
    assert!(matches!(
        solver.kernel(&mf, CiTarget::Full),
        Err(ScfError::CiSpaceTooLarge(_))
    ));
}

#[test]
fn test_unrestricted_fci_matches_restricted() {
    let rhf = h2();
    let uhf = run("H 0 0 0; H 0 0 1.4", "bohr", 0, "UHF");
    let r = CISolver::default().kernel(&rhf, CiTarget::Full).unwrap();
    let u = CISolver::default().kernel(&uhf, CiTarget::Full).unwrap();
    assert_relative_eq!(r.e_tot[0], u.e_tot[0], epsilon = 1e-8);
}

#[test]
fn test_casci_full_space_is_fci() {
    let mf = h2();
    let mut cas = CASCI::new(2, 2);
    let e = cas.kernel(&mf).unwrap();
    let fci = CISolver::default().kernel(&mf, CiTarget::Full).unwrap();
    assert_relative_eq!(e, fci.e_tot[0], epsilon = 1e-10);
    assert_relative_eq!(cas.e_tot().unwrap(), e);
}

#[test]
fn test_casci_single_determinant_is_hf() {
    // one doubly occupied active orbital reproduces the reference
    let mf = lih();
    let mut cas = CASCI::new(1, 2);
    let e = cas.kernel(&mf).unwrap();
    assert_relative_eq!(e, mf.e_tot().unwrap(), epsilon = 1e-8);
}

#[test]
fn test_active_space_validation() {
    let mf = lih();
    // odd core
    assert!(CASCI::new(2, 3).kernel(&mf).is_err());
    // too many orbitals
    assert!(CASCI::new(10, 2).kernel(&mf).is_err());
    // more electrons than molecule
    assert!(CASCI::new(4, 6).kernel(&mf).is_err());

    let open = run("H 0 0 0", "bohr", 1, "UHF");
    let cas = ActiveSpace::new(&open.mol, 1, 1, 1).unwrap();
    assert_eq!((cas.ncore, cas.nalpha, cas.nbeta), (0, 1, 0));
}

#[test]
fn test_casscf_lowers_casci() {
    let mf = lih();
    let mut cas = CASCI::new(2, 2);
    let e_casci = cas.kernel(&mf).unwrap();
    let mut mc = CASSCF::new(2, 2);
    let e_casscf = mc.kernel(&mf).unwrap();
    let fci = CISolver::default().kernel(&mf, CiTarget::Full).unwrap();
    assert!(e_casscf <= e_casci + 1e-8);
    assert!(e_casscf >= fci.e_tot[0] - 1e-8);
    let c = mc.mo_coeff.unwrap();
    let s = &mf.integrals().unwrap().overlap;
    let should_be_identity = c.transpose() * s * &c;
    let n = should_be_identity.nrows();
    assert!((should_be_identity - nalgebra::DMatrix::<f64>::identity(n, n)).norm() < 1e-8);
}

#[test]
fn test_casscf_without_rotations_is_casci() {
    let mf = h2();
    let mut mc = CASSCF::new(2, 2);
    let e = mc.kernel(&mf).unwrap();
    assert!(mc.converged);
    assert_eq!(mc.cycles, 0);
    let mut cas = CASCI::new(2, 2);
    assert_relative_eq!(e, cas.kernel(&mf).unwrap(), epsilon = 1e-10);
}

#[test]
fn test_tda_h2() {
    let mf = h2();
    let singlet = TDA::new(3, true).kernel(&mf).unwrap();
    let triplet = TDA::new(3, false).kernel(&mf).unwrap();
    assert_eq!(singlet.len(), 1);
    assert!(triplet[0] > 0.0);
    assert!(singlet[0] > triplet[0]);
    // ε_2 - ε_1 + 2K - J with the textbook integrals
    assert!((singlet[0] - 0.947).abs() < 0.01, "got {}", singlet[0]);
}

#[test]
fn test_tda_unrestricted_contains_both_multiplicities() {
    let rhf = h2();
    let uhf = run("H 0 0 0; H 0 0 1.4", "bohr", 0, "UHF");
    let singlet = TDA::default().kernel(&rhf).unwrap();
    let triplet = TDA::new(3, false).kernel(&rhf).unwrap();
    let both = TDA::default().kernel(&uhf).unwrap();
    assert_eq!(both.len(), 2);
    assert_relative_eq!(both[0], triplet[0], epsilon = 1e-6);
    assert_relative_eq!(both[1], singlet[0], epsilon = 1e-6);
}

#[test]
fn test_tda_is_sorted_and_truncated() {
    let mf = lih();
    let e = TDA::new(2, true).kernel(&mf).unwrap();
    assert_eq!(e.len(), 2);
    assert!(e[0] <= e[1]);
}
