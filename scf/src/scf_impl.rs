//! Hartree-Fock mean-field solvers with DIIS acceleration
//!
//! This module provides the DIIS (Direct Inversion in the Iterative Subspace)
//! accelerator, the Roothaan-Hall helpers shared by the restricted and
//! unrestricted kernels, and [`MeanField`], the object handed around by the
//! workflow runner.

extern crate nalgebra as na;

mod restricted;
mod unrestricted;

use crate::error::ScfError;
use crate::integrals::Integrals;
use crate::mole::Mole;
use na::{DMatrix, DVector, Vector3};
use std::sync::Arc;
use tracing::{debug, info};

/// Atomic units of dipole to Debye.
pub const AU2DEBYE: f64 = 2.541746;

/// DIIS (Direct Inversion in the Iterative Subspace) convergence accelerator
///
/// The error matrix is the commutator E = FDS - SDF. The extrapolated Fock
/// matrix is F_DIIS = Σ c_i F_i with the c_i minimising ||Σ c_i E_i||^2
/// subject to Σ c_i = 1.
#[derive(Debug, Clone)]
pub struct DIIS {
    error_matrices: Vec<DMatrix<f64>>,
    fock_matrices: Vec<DMatrix<f64>>,
    max_subspace_size: usize,
}

impl DIIS {
    pub fn new(max_subspace_size: usize) -> Self {
        DIIS {
            error_matrices: Vec::new(),
            fock_matrices: Vec::new(),
            max_subspace_size: max_subspace_size.max(1),
        }
    }

    /// FDS - SDF
    pub fn calculate_error_matrix(
        fock: &DMatrix<f64>,
        density: &DMatrix<f64>,
        overlap: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        fock * density * overlap - overlap * density * fock
    }

    /// Adds a Fock matrix and its error matrix, dropping the oldest pair
    /// when the subspace is full.
    pub fn update(&mut self, fock_matrix: DMatrix<f64>, error: DMatrix<f64>) {
        if self.error_matrices.len() >= self.max_subspace_size {
            self.error_matrices.remove(0);
            self.fock_matrices.remove(0);
        }
        self.error_matrices.push(error);
        self.fock_matrices.push(fock_matrix);
    }

    /// Returns None if the DIIS equations cannot be solved (singular B matrix).
    pub fn extrapolate(&self) -> Option<DMatrix<f64>> {
        let n = self.error_matrices.len();
        if n == 0 {
            return None;
        }

        // B_ij = <e_i|e_j>, bordered by the normalisation constraint
        let mut b = DMatrix::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..=i {
                let bij = self.error_matrices[i].dot(&self.error_matrices[j]);
                b[(i, j)] = bij;
                b[(j, i)] = bij;
            }
            b[(i, n)] = -1.0;
            b[(n, i)] = -1.0;
        }

        let mut rhs = DVector::zeros(n + 1);
        rhs[n] = -1.0;

        let coeffs = match b.lu().solve(&rhs) {
            Some(x) => x,
            None => {
                debug!("DIIS extrapolation failed: singular B matrix");
                return None;
            }
        };

        let mut fock_extrapolated =
            DMatrix::zeros(self.fock_matrices[0].nrows(), self.fock_matrices[0].ncols());
        for i in 0..n {
            fock_extrapolated += &self.fock_matrices[i] * coeffs[i];
        }
        Some(fock_extrapolated)
    }

    pub fn reset(&mut self) {
        self.error_matrices.clear();
        self.fock_matrices.clear();
    }

    pub fn size(&self) -> usize {
        self.error_matrices.len()
    }
}

/// Flips each eigenvector so that its largest component is positive.
pub fn align_eigenvectors(mut eigvecs: DMatrix<f64>) -> DMatrix<f64> {
    for j in 0..eigvecs.ncols() {
        let max_val = eigvecs
            .column(j)
            .iter()
            .copied()
            .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
        if max_val < 0.0 {
            eigvecs.column_mut(j).neg_mut();
        }
    }
    eigvecs
}

/// Eigen decomposition of a symmetric matrix with ascending eigenvalues.
pub fn sorted_symmetric_eigen(m: DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let eig = m.symmetric_eigen();
    let mut indices: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    indices.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));
    let values = DVector::from_fn(indices.len(), |i, _| eig.eigenvalues[indices[i]]);
    let vectors = eig.eigenvectors.select_columns(&indices);
    (values, vectors)
}

/// Canonical orthogonaliser X with X^T S X = 1; near linear dependencies
/// (overlap eigenvalues below 1e-10) are projected out.
pub fn orthogonalizer(overlap: &DMatrix<f64>) -> DMatrix<f64> {
    let (values, vectors) = sorted_symmetric_eigen(overlap.clone());
    let kept: Vec<usize> = (0..values.len()).filter(|&i| values[i] > 1e-10).collect();
    let mut x = vectors.select_columns(&kept);
    for (col, &i) in kept.iter().enumerate() {
        x.column_mut(col).scale_mut(1.0 / values[i].sqrt());
    }
    x
}

/// Solves F C = S C e in the orthogonal basis X.
pub fn solve_roothaan(fock: &DMatrix<f64>, x: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let f_prime = x.transpose() * fock * x;
    let (e, c_prime) = sorted_symmetric_eigen(f_prime);
    (e, align_eigenvectors(x * c_prime))
}

/// Σ_i occ_i C_μi C_νi over the first `nocc` orbitals.
pub fn density_matrix(coeffs: &DMatrix<f64>, nocc: usize, occupation: f64) -> DMatrix<f64> {
    let occupied = coeffs.columns(0, nocc);
    occupied * occupied.transpose() * occupation
}

pub(crate) fn block_diag(a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    let mut m = DMatrix::zeros(a.nrows() + b.nrows(), a.ncols() + b.ncols());
    m.view_mut((0, 0), a.shape()).copy_from(a);
    m.view_mut((a.nrows(), a.ncols()), b.shape()).copy_from(b);
    m
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Restricted,
    Unrestricted,
}

#[derive(Debug, Clone)]
pub struct ScfSettings {
    pub conv_tol: f64,
    pub conv_tol_grad: Option<f64>,
    pub max_cycle: usize,
    pub diis: bool,
    pub diis_space: usize,
    pub diis_start_cycle: usize,
    pub level_shift: f64,
    pub damp: f64,
    pub init_guess: String,
    pub verbose: i64,
    pub max_memory: f64,
    pub direct_scf: bool,
    pub chkfile: Option<String>,
}

impl Default for ScfSettings {
    fn default() -> Self {
        ScfSettings {
            conv_tol: 1e-9,
            conv_tol_grad: None,
            max_cycle: 50,
            diis: true,
            diis_space: 8,
            diis_start_cycle: 1,
            level_shift: 0.0,
            damp: 0.0,
            init_guess: "minao".to_string(),
            verbose: 3,
            max_memory: 4000.0,
            direct_scf: true,
            chkfile: None,
        }
    }
}

impl ScfSettings {
    pub(crate) fn grad_threshold(&self) -> f64 {
        self.conv_tol_grad.unwrap_or_else(|| self.conv_tol.sqrt())
    }
}

/// Orbitals of one spin channel.
#[derive(Debug, Clone)]
pub struct Orbitals {
    pub mo_energy: DVector<f64>,
    pub mo_coeff: DMatrix<f64>,
    pub mo_occ: DVector<f64>,
}

impl Orbitals {
    pub fn nocc(&self) -> usize {
        self.mo_occ.iter().filter(|&&o| o > 0.0).count()
    }
}

#[derive(Debug, Clone)]
pub struct ScfSolution {
    pub e_tot: f64,
    pub converged: bool,
    pub cycles: usize,
    /// One entry for restricted, alpha then beta for unrestricted.
    pub orbitals: Vec<Orbitals>,
    /// AO density per spin channel (the restricted one is spin summed).
    pub densities: Vec<DMatrix<f64>>,
}

/// A Hartree-Fock object bound to a molecule.
#[derive(Debug, Clone)]
pub struct MeanField {
    pub method: String,
    pub mol: Mole,
    pub settings: ScfSettings,
    pub reference: Reference,
    integrals: Option<Arc<Integrals>>,
    solution: Option<ScfSolution>,
}

impl MeanField {
    /// `method` is one of HF, RHF or UHF (case-insensitive). HF picks the
    /// restricted solver for closed shells and the unrestricted one otherwise.
    pub fn new(method: &str, mol: Mole) -> Result<Self, ScfError> {
        if !mol.is_built() {
            return Err(ScfError::NotBuilt("Mole"));
        }
        let method = method.to_uppercase();
        let reference = match method.as_str() {
            "HF" if mol.spin == 0 => Reference::Restricted,
            "HF" | "UHF" => Reference::Unrestricted,
            "RHF" if mol.spin == 0 => Reference::Restricted,
            "RHF" => {
                return Err(ScfError::Unsupported(
                    "restricted open-shell Hartree-Fock".to_string(),
                ))
            }
            other => return Err(ScfError::Unsupported(format!("{} mean field", other))),
        };
        let mut settings = ScfSettings::default();
        settings.verbose = mol.verbose;
        Ok(MeanField {
            method,
            mol,
            settings,
            reference,
            integrals: None,
            solution: None,
        })
    }

    /// Runs the SCF iterations and returns the total energy.
    pub fn kernel(&mut self) -> Result<f64, ScfError> {
        info!("#####################################################");
        info!("  {} calculation", self.method);
        info!("#####################################################");

        if !self.settings.init_guess.eq_ignore_ascii_case("1e")
            && !self.settings.init_guess.eq_ignore_ascii_case("hcore")
        {
            debug!(
                "initial guess `{}` replaced by the core Hamiltonian guess",
                self.settings.init_guess
            );
        }

        let ints = Arc::new(Integrals::compute(&self.mol));
        let (nalpha, nbeta) = self.mol.nelec();
        let solution = match self.reference {
            Reference::Restricted => restricted::run(&ints, nalpha, &self.settings)?,
            Reference::Unrestricted => unrestricted::run(&ints, nalpha, nbeta, &self.settings)?,
        };

        if solution.converged {
            info!(
                "converged {} energy = {:.12} after {} cycles",
                self.method, solution.e_tot, solution.cycles
            );
        } else {
            info!(
                "{} not converged after {} cycles, energy = {:.12}",
                self.method, solution.cycles, solution.e_tot
            );
        }

        let e_tot = solution.e_tot;
        self.integrals = Some(ints);
        self.solution = Some(solution);
        Ok(e_tot)
    }

    /// A fresh, not yet run, copy of this object for another geometry.
    pub fn at_geometry(&self, coords: &[Vector3<f64>]) -> Result<MeanField, ScfError> {
        let mut mol = self.mol.clone();
        mol.set_geom(coords)?;
        Ok(MeanField {
            method: self.method.clone(),
            mol,
            settings: self.settings.clone(),
            reference: self.reference,
            integrals: None,
            solution: None,
        })
    }

    pub fn is_run(&self) -> bool {
        self.solution.is_some()
    }

    pub fn solution(&self) -> Result<&ScfSolution, ScfError> {
        self.solution.as_ref().ok_or(ScfError::NotRun("mean field"))
    }

    pub fn integrals(&self) -> Result<&Integrals, ScfError> {
        self.integrals
            .as_deref()
            .ok_or(ScfError::NotRun("mean field"))
    }

    pub fn e_tot(&self) -> Result<f64, ScfError> {
        Ok(self.solution()?.e_tot)
    }

    pub fn converged(&self) -> Result<bool, ScfError> {
        Ok(self.solution()?.converged)
    }

    pub fn energy_nuc(&self) -> f64 {
        self.mol.energy_nuc()
    }

    pub fn energy_elec(&self) -> Result<f64, ScfError> {
        Ok(self.e_tot()? - self.energy_nuc())
    }

    /// Spin-summed AO density matrix.
    pub fn make_rdm1(&self) -> Result<DMatrix<f64>, ScfError> {
        let densities = &self.solution()?.densities;
        Ok(densities
            .iter()
            .skip(1)
            .fold(densities[0].clone(), |acc, d| acc + d))
    }

    /// Dipole moment in Debye with the origin at (0, 0, 0).
    pub fn dip_moment(&self) -> Result<Vector3<f64>, ScfError> {
        let ints = self.integrals()?;
        let dm = self.make_rdm1()?;
        let electronic = Vector3::new(
            dm.dot(&ints.dipole[0]),
            dm.dot(&ints.dipole[1]),
            dm.dot(&ints.dipole[2]),
        );
        let nuclear = self
            .mol
            .atoms()
            .iter()
            .fold(Vector3::zeros(), |acc, a| acc + a.coord * a.charge as f64);
        let dipole = (nuclear - electronic) * AU2DEBYE;
        info!(
            "dipole moment (Debye): [{:.5}, {:.5}, {:.5}]",
            dipole.x, dipole.y, dipole.z
        );
        Ok(dipole)
    }

    /// (<S^2>, 2S+1)
    pub fn spin_square(&self) -> Result<(f64, f64), ScfError> {
        let solution = self.solution()?;
        let (na, nb) = self.mol.nelec();
        let sz = (na as f64 - nb as f64) / 2.0;
        let mut ss = sz * (sz + 1.0);
        if solution.orbitals.len() == 2 {
            let s = &self.integrals()?.overlap;
            let ca = solution.orbitals[0].mo_coeff.columns(0, na);
            let cb = solution.orbitals[1].mo_coeff.columns(0, nb);
            let overlap = ca.transpose() * s * cb;
            ss += nb as f64 - overlap.norm_squared();
        }
        let multiplicity = (1.0 + 4.0 * ss).sqrt();
        Ok((ss, multiplicity))
    }
}
