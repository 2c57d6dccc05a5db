//! Steepest Descent optimization algorithm

extern crate nalgebra as na;

use super::{Minimizer, Minimum, Objective};
use crate::error::ScfError;
use na::DVector;
use tracing::info;

pub(super) fn minimize<O: Objective>(
    settings: &Minimizer,
    objective: &O,
    x0: DVector<f64>,
) -> Result<Minimum, ScfError> {
    let mut point = settings.evaluate(objective, x0)?;
    let mut energy_change = 0.0;
    let mut step = 1.0;
    let mut converged = settings.is_converged(&point, energy_change);
    let mut cycles = 0;
    settings.log_progress(0, &point, energy_change);

    while !converged && cycles < settings.max_cycle {
        cycles += 1;
        let direction = -&point.gradient;
        let Some((alpha, x, _)) = settings.line_search(objective, &point, &direction, step)? else {
            info!("    line search found no lower point, stopping");
            break;
        };
        // grow the trial step after a success
        step = alpha * 2.0;
        let next = settings.evaluate(objective, x)?;
        energy_change = next.value - point.value;
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
