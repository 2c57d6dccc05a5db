//! Conjugate Gradient optimization algorithm

extern crate nalgebra as na;

use super::{Minimizer, Minimum, Objective};
use crate::error::ScfError;
use na::DVector;
use tracing::info;

/// Polak-Ribière+ coefficient, clipped at zero so that a bad direction
/// turns into a steepest descent restart.
fn beta_polak_ribiere_plus(gradient: &DVector<f64>, previous: &DVector<f64>) -> f64 {
    let denominator = previous.dot(previous);
    if denominator < 1e-24 {
        return 0.0;
    }
    (gradient.dot(&(gradient - previous)) / denominator).max(0.0)
}

pub(super) fn minimize<O: Objective>(
    settings: &Minimizer,
    objective: &O,
    x0: DVector<f64>,
) -> Result<Minimum, ScfError> {
    let mut point = settings.evaluate(objective, x0)?;
    let mut direction = -&point.gradient;
    let mut energy_change = 0.0;
    let mut step = 1.0;
    let mut converged = settings.is_converged(&point, energy_change);
    let mut cycles = 0;
    settings.log_progress(0, &point, energy_change);

    while !converged && cycles < settings.max_cycle {
        cycles += 1;
        if point.gradient.dot(&direction) >= 0.0 {
            info!("    Restarting CG: direction became uphill");
            direction = -&point.gradient;
        }
        let Some((alpha, x, _)) = settings.line_search(objective, &point, &direction, step)? else {
            info!("    line search found no lower point, stopping");
            break;
        };
        step = alpha * 2.0;
        let next = settings.evaluate(objective, x)?;
        energy_change = next.value - point.value;

        let beta = beta_polak_ribiere_plus(&next.gradient, &point.gradient);
        direction = -&next.gradient + direction * beta;
        point = next;
        settings.log_progress(cycles, &point, energy_change);
        converged = settings.is_converged(&point, energy_change);
    }

    Ok(Minimum {
        x: point.x,
        value: point.value,
        gradient: point.gradient,
        converged,
        cycles,
    })
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_beta_is_never_negative() {
        let g = DVector::from_vec(vec![0.1, 0.0]);
        let prev = DVector::from_vec(vec![1.0, 0.0]);
        assert_eq!(beta_polak_ribiere_plus(&g, &prev), 0.0);
        let g = DVector::from_vec(vec![0.0, 1.0]);
        assert!((beta_polak_ribiere_plus(&g, &prev) - 1.0).abs() < 1e-12);
    }
}
