use super::objective::{self, Objective};
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use tracing::{debug, info};

const ARMIJO_FACTOR: f64 = 1e-4;
const INITIAL_STEP: f64 = 1.0;
const MIN_STEP: f64 = 1e-20;
const MAX_STEP: f64 = 1e12;
const REPORT_INTERVAL: usize = 100;

#[derive(Debug, Clone, Copy)]
pub(crate) struct DescentOptions {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub verbose: u8,
}

#[derive(Debug, Clone)]
pub(crate) struct DescentResult {
    pub points: Vec<Point3<f64>>,
    pub iterations: usize,
    pub converged: bool,
    pub initial_value: f64,
    pub value: f64,
}

/// Gradient descent with Armijo backtracking. The step doubles after every
/// accepted move and halves while the sufficient-decrease test fails.
pub(crate) fn minimize(
    objective: &mut dyn Objective,
    mut points: Vec<Point3<f64>>,
    options: &DescentOptions,
    reporter: &ProgressReporter,
) -> DescentResult {
    objective.refit(&points);
    let initial_value = objective::value(objective, &points);
    let mut current = initial_value;
    let mut step = INITIAL_STEP;
    let mut iterations = 0;
    let mut converged = false;

    reporter.report(Progress::TaskStart {
        total_steps: options.max_iterations as u64,
    });

    while iterations < options.max_iterations {
        if objective.refit(&points) {
            current = objective::value(objective, &points);
        }

        let grad = objective::gradient(objective, &points);
        let grad_sq: f64 = grad.iter().map(|g| g.norm_squared()).sum();
        if !grad_sq.is_finite() {
            debug!(iteration = iterations, "Gradient is not finite; stopping descent.");
            break;
        }
        if grad_sq.sqrt() <= options.tolerance {
            converged = true;
            break;
        }

        let mut accepted = None;
        while step > MIN_STEP {
            let candidate: Vec<Point3<f64>> = points
                .iter()
                .zip(&grad)
                .map(|(p, g)| p - g * step)
                .collect();
            let candidate_value = objective::value(objective, &candidate);
            if candidate_value.is_finite()
                && candidate_value <= current - ARMIJO_FACTOR * step * grad_sq
            {
                accepted = Some((candidate, candidate_value));
                break;
            }
            step *= 0.5;
        }

        iterations += 1;
        reporter.report(Progress::TaskIncrement);

        // No representable step decreases the objective: a numerical stationary point.
        let Some((candidate, candidate_value)) = accepted else {
            converged = true;
            break;
        };

        let change = (current - candidate_value).abs() / current.abs().max(1.0);
        points = candidate;
        current = candidate_value;

        if options.verbose > 0 && iterations % REPORT_INTERVAL == 0 {
            info!(iteration = iterations, objective = current, "Descent progress.");
        }

        if change <= options.tolerance {
            converged = true;
            break;
        }
        step = (step * 2.0).min(MAX_STEP);
    }

    reporter.report(Progress::TaskFinish);

    DescentResult {
        points,
        iterations,
        converged,
        initial_value,
        value: current,
    }
}
