use super::*;
use crate::grad::{GradTarget, Gradients};
use crate::mole::Mole;
use crate::scf_impl::MeanField;
use approx::assert_relative_eq;
use nalgebra::DVector;

/// (x - 1)^2 + 10 (y + 2)^2
struct Bowl;

impl Objective for Bowl {
    fn value(&self, x: &DVector<f64>) -> Result<f64, ScfError> {
        Ok((x[0] - 1.0).powi(2) + 10.0 * (x[1] + 2.0).powi(2))
    }
}

/// Rosenbrock valley with its analytic gradient.
struct Rosenbrock;

impl Objective for Rosenbrock {
    fn value(&self, x: &DVector<f64>) -> Result<f64, ScfError> {
        Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2))
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>, ScfError> {
        let dx = -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]);
        let dy = 200.0 * (x[1] - x[0] * x[0]);
        Ok(DVector::from_vec(vec![dx, dy]))
    }
}

/// Ill-conditioned quadratic 1/2 x^T A x - b^T x with an analytic gradient.
struct Valley;

impl Valley {
    fn a() -> nalgebra::DMatrix<f64> {
        nalgebra::DMatrix::from_row_slice(3, 3, &[20.0, 2.0, 0.0, 2.0, 5.0, 1.0, 0.0, 1.0, 1.0])
    }

    fn b() -> DVector<f64> {
        DVector::from_vec(vec![1.0, -1.0, 0.5])
    }
}

impl Objective for Valley {
    fn value(&self, x: &DVector<f64>) -> Result<f64, ScfError> {
        Ok(0.5 * x.dot(&(Self::a() * x)) - Self::b().dot(x))
    }

    fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>, ScfError> {
        Ok(Self::a() * x - Self::b())
    }
}

fn tight(algorithm: Algorithm) -> Minimizer {
    Minimizer {
        algorithm,
        max_cycle: 2000,
        conv_tol: 1e-10,
        conv_tol_grad: 1e-5,
        max_step: 0.5,
    }
}

#[test]
fn test_central_difference_matches_analytic() {
    let x = DVector::from_vec(vec![0.3, 0.7]);
    let numeric = central_difference(&Rosenbrock, &x, 1e-5).unwrap();
    let analytic = Rosenbrock.gradient(&x).unwrap();
    assert_relative_eq!(numeric, analytic, epsilon = 1e-5);
}

#[test]
fn test_steepest_descent_bowl() {
    let m = tight(Algorithm::SteepestDescent)
        .minimize(&Bowl, DVector::zeros(2))
        .unwrap();
    assert!(m.converged);
    assert_relative_eq!(m.x[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(m.x[1], -2.0, epsilon = 1e-4);
}

#[test]
fn test_conjugate_gradient_valley() {
    let exact = Valley::a().lu().solve(&Valley::b()).unwrap();
    for algorithm in [Algorithm::ConjugateGradient, Algorithm::SteepestDescent] {
        let m = tight(algorithm).minimize(&Valley, DVector::zeros(3)).unwrap();
        assert!(m.converged, "{:?} stopped after {} cycles", algorithm, m.cycles);
        assert_relative_eq!(m.x, exact, epsilon = 1e-4);
    }
}

#[test]
fn test_already_converged_takes_no_steps() {
    let m = Minimizer::default()
        .minimize(&Bowl, DVector::from_vec(vec![1.0, -2.0]))
        .unwrap();
    assert!(m.converged);
    assert_eq!(m.cycles, 0);
}

#[test]
fn test_algorithm_names() {
    assert_eq!("CG".parse::<Algorithm>().unwrap(), Algorithm::ConjugateGradient);
    assert_eq!("sd".parse::<Algorithm>().unwrap(), Algorithm::SteepestDescent);
    assert!("bfgs".parse::<Algorithm>().is_err());
}

#[test]
fn test_h2_geometry_optimization() {
    let mut mol = Mole::new();
    mol.atom = "H 0 0 0; H 0 0 1.6".to_string();
    mol.unit = "bohr".to_string();
    mol.build().unwrap();
    let mf = MeanField::new("RHF", mol).unwrap();
    let mut opt = GeometryOptimizer::new(Gradients::new(GradTarget::MeanField(mf)));
    let result = opt.kernel().unwrap().clone();
    assert!(result.converged);
    let coords = result.mol.coords();
    let bond = (coords[1] - coords[0]).norm();
    assert!((bond - 1.346).abs() < 0.01, "bond {}", bond);
    assert!(result.e_tot < -1.11);
    assert!(opt.result().is_ok());
}
