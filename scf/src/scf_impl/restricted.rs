//! Closed-shell restricted Hartree-Fock.

use super::{
    density_matrix, orthogonalizer, solve_roothaan, Orbitals, ScfSettings, ScfSolution, DIIS,
};
use crate::error::ScfError;
use crate::integrals::Integrals;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

pub(crate) fn fock_matrix(ints: &Integrals, density: &DMatrix<f64>) -> DMatrix<f64> {
    let (j, k) = ints.jk(density);
    &ints.hcore + j - k * 0.5
}

pub(crate) fn electronic_energy(
    ints: &Integrals,
    density: &DMatrix<f64>,
    fock: &DMatrix<f64>,
) -> f64 {
    0.5 * density.dot(&(&ints.hcore + fock))
}

/// Runs RHF for `nocc` doubly occupied orbitals, starting from the core
/// Hamiltonian guess.
pub(crate) fn run(
    ints: &Integrals,
    nocc: usize,
    settings: &ScfSettings,
) -> Result<ScfSolution, ScfError> {
    let s = &ints.overlap;
    let x = orthogonalizer(s);
    if x.ncols() < nocc {
        return Err(ScfError::LinearAlgebra(format!(
            "{} independent basis functions cannot hold {} occupied orbitals",
            x.ncols(),
            nocc
        )));
    }

    let (_, mut coeffs) = solve_roothaan(&ints.hcore, &x);
    let mut density = density_matrix(&coeffs, nocc, 2.0);
    let mut diis = DIIS::new(settings.diis_space);

    let mut e_old = 0.0;
    let mut e_tot = 0.0;
    let mut converged = false;
    let mut cycles = 0;
    let mut fock = fock_matrix(ints, &density);

    for cycle in 0..settings.max_cycle {
        cycles = cycle + 1;
        fock = fock_matrix(ints, &density);
        e_tot = electronic_energy(ints, &density, &fock) + ints.e_nuc;
        let error = DIIS::calculate_error_matrix(&fock, &density, s);
        let grad_norm = error.norm();
        let delta = e_tot - e_old;
        debug!(
            "cycle {:3}: E = {:.12}  dE = {:.3e}  |g| = {:.3e}",
            cycle, e_tot, delta, grad_norm
        );

        if cycle > 0 && delta.abs() < settings.conv_tol && grad_norm < settings.grad_threshold() {
            converged = true;
            break;
        }
        e_old = e_tot;

        let mut f_step = fock.clone();
        if settings.diis && cycle + 1 >= settings.diis_start_cycle {
            diis.update(fock.clone(), error);
            if let Some(extrapolated) = diis.extrapolate() {
                f_step = extrapolated;
            }
        }
        if settings.level_shift > 0.0 {
            // raise the virtual space: F + shift (S - S D S / 2)
            let sds = s * &density * s * 0.5;
            f_step += (s - sds) * settings.level_shift;
        }

        let (_, c) = solve_roothaan(&f_step, &x);
        coeffs = c;
        let new_density = density_matrix(&coeffs, nocc, 2.0);
        density = if settings.damp > 0.0 && cycle > 0 {
            new_density * (1.0 - settings.damp) + &density * settings.damp
        } else {
            new_density
        };
    }

    let (mo_energy, mo_coeff) = solve_roothaan(&fock, &x);
    let nmo = mo_energy.len();
    let mo_occ = DVector::from_fn(nmo, |i, _| if i < nocc { 2.0 } else { 0.0 });

    Ok(ScfSolution {
        e_tot,
        converged,
        cycles,
        orbitals: vec![Orbitals {
            mo_energy,
            mo_coeff,
            mo_occ,
        }],
        densities: vec![density],
    })
}
