//! Unrestricted Hartree-Fock.
//!
//! The alpha and beta problems are iterated together; DIIS works on the
//! block-diagonal Fock and error matrices so both channels share one set of
//! extrapolation coefficients.

use super::{
    block_diag, density_matrix, orthogonalizer, solve_roothaan, Orbitals, ScfSettings,
    ScfSolution, DIIS,
};
use crate::error::ScfError;
use crate::integrals::Integrals;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

pub(crate) fn fock_matrices(
    ints: &Integrals,
    da: &DMatrix<f64>,
    db: &DMatrix<f64>,
) -> (DMatrix<f64>, DMatrix<f64>) {
    let (ja, ka) = ints.jk(da);
    let (jb, kb) = ints.jk(db);
    let j = ja + jb;
    (&ints.hcore + &j - ka, &ints.hcore + &j - kb)
}

pub(crate) fn electronic_energy(
    ints: &Integrals,
    da: &DMatrix<f64>,
    db: &DMatrix<f64>,
    fa: &DMatrix<f64>,
    fb: &DMatrix<f64>,
) -> f64 {
    0.5 * ((da + db).dot(&ints.hcore) + da.dot(fa) + db.dot(fb))
}

pub(crate) fn run(
    ints: &Integrals,
    nalpha: usize,
    nbeta: usize,
    settings: &ScfSettings,
) -> Result<ScfSolution, ScfError> {
    let s = &ints.overlap;
    let n = s.nrows();
    let x = orthogonalizer(s);
    if x.ncols() < nalpha {
        return Err(ScfError::LinearAlgebra(format!(
            "{} independent basis functions cannot hold {} alpha electrons",
            x.ncols(),
            nalpha
        )));
    }
    let s2 = block_diag(s, s);

    let (_, c0) = solve_roothaan(&ints.hcore, &x);
    let mut da = density_matrix(&c0, nalpha, 1.0);
    let mut db = density_matrix(&c0, nbeta, 1.0);
    let mut diis = DIIS::new(settings.diis_space);

    let mut e_old = 0.0;
    let mut e_tot = 0.0;
    let mut converged = false;
    let mut cycles = 0;
    let (mut fa, mut fb) = fock_matrices(ints, &da, &db);

    for cycle in 0..settings.max_cycle {
        cycles = cycle + 1;
        (fa, fb) = fock_matrices(ints, &da, &db);
        e_tot = electronic_energy(ints, &da, &db, &fa, &fb) + ints.e_nuc;

        let f2 = block_diag(&fa, &fb);
        let d2 = block_diag(&da, &db);
        let error = DIIS::calculate_error_matrix(&f2, &d2, &s2);
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

        let mut f_step = f2.clone();
        if settings.diis && cycle + 1 >= settings.diis_start_cycle {
            diis.update(f2, error);
            if let Some(extrapolated) = diis.extrapolate() {
                f_step = extrapolated;
            }
        }
        let mut fa_step = f_step.view((0, 0), (n, n)).into_owned();
        let mut fb_step = f_step.view((n, n), (n, n)).into_owned();
        if settings.level_shift > 0.0 {
            fa_step += (s - s * &da * s) * settings.level_shift;
            fb_step += (s - s * &db * s) * settings.level_shift;
        }

        let (_, ca) = solve_roothaan(&fa_step, &x);
        let (_, cb) = solve_roothaan(&fb_step, &x);
        let new_da = density_matrix(&ca, nalpha, 1.0);
        let new_db = density_matrix(&cb, nbeta, 1.0);
        if settings.damp > 0.0 && cycle > 0 {
            da = new_da * (1.0 - settings.damp) + &da * settings.damp;
            db = new_db * (1.0 - settings.damp) + &db * settings.damp;
        } else {
            da = new_da;
            db = new_db;
        }
    }

    let channels = [(&fa, nalpha), (&fb, nbeta)].map(|(f, nocc)| {
        let (mo_energy, mo_coeff) = solve_roothaan(f, &x);
        let nmo = mo_energy.len();
        Orbitals {
            mo_energy,
            mo_coeff,
            mo_occ: DVector::from_fn(nmo, |i, _| if i < nocc { 1.0 } else { 0.0 }),
        }
    });

    Ok(ScfSolution {
        e_tot,
        converged,
        cycles,
        orbitals: channels.into_iter().collect(),
        densities: vec![da, db],
    })
}
