//! Fits bead coordinates to a contact-count matrix.
//!
//! All three variants share one entry point, [`solve`], and one descent loop;
//! they differ only in the per-pair objective.

mod objective;
mod optimizer;

use crate::core::models::contacts::ContactMatrix;
use crate::core::models::coordinates::CoordinateSet;
use crate::engine::config::{ConfigError, SolverConfig, SolverVariant};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::{DMatrix, Point3};
use objective::{Objective, PoissonObjective, StressObjective};
use optimizer::DescentOptions;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SolverReport {
    pub variant: SolverVariant,
    pub iterations: usize,
    pub converged: bool,
    pub initial_objective: f64,
    pub objective: f64,
    /// Final `beta`; equal to the configured value except for PM2.
    pub beta: f64,
}

#[derive(Debug, Clone)]
pub struct StructureSolution {
    pub coordinates: CoordinateSet,
    pub report: SolverReport,
}

fn validate(config: &SolverConfig) -> Result<(), ConfigError> {
    if !config.alpha.is_finite() || config.alpha == 0.0 {
        return Err(ConfigError::InvalidValue {
            key: "alpha",
            reason: format!("must be finite and nonzero, got {}", config.alpha),
        });
    }
    if !config.beta.is_finite() || config.beta <= 0.0 {
        return Err(ConfigError::InvalidValue {
            key: "beta",
            reason: format!("must be finite and positive, got {}", config.beta),
        });
    }
    Ok(())
}

fn initial_points(beads: usize, scale: f64, rng: &mut StdRng) -> Vec<Point3<f64>> {
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    (0..beads)
        .map(|_| {
            Point3::new(
                rng.gen_range(-0.5..0.5) * scale,
                rng.gen_range(-0.5..0.5) * scale,
                rng.gen_range(-0.5..0.5) * scale,
            )
        })
        .collect()
}

/// Validates a raw count matrix and solves it.
pub fn solve_counts(
    counts: DMatrix<f64>,
    config: &SolverConfig,
    reporter: &ProgressReporter,
) -> Result<StructureSolution, EngineError> {
    let contacts = ContactMatrix::new(counts)?;
    solve(&contacts, config, reporter)
}

/// Returns one point per row of `contacts`. Identical inputs and seed give
/// identical coordinates.
#[instrument(skip_all, name = "structure_solver", fields(variant = %config.variant, beads = contacts.size()))]
pub fn solve(
    contacts: &ContactMatrix,
    config: &SolverConfig,
    reporter: &ProgressReporter,
) -> Result<StructureSolution, EngineError> {
    validate(config)?;

    let mut objective: Box<dyn Objective + '_> = match config.variant {
        SolverVariant::Mds => Box::new(StressObjective::new(contacts, config.alpha, config.beta)),
        SolverVariant::Pm1 => Box::new(PoissonObjective::new(
            contacts,
            config.alpha,
            config.beta,
            false,
        )),
        SolverVariant::Pm2 => Box::new(PoissonObjective::new(
            contacts,
            config.alpha,
            config.beta,
            true,
        )),
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let start = initial_points(contacts.size(), objective.length_scale(), &mut rng);

    info!(
        max_iterations = config.max_iterations,
        "Solving {} structure for {} beads.",
        config.variant,
        contacts.size()
    );
    reporter.report(Progress::PhaseStart {
        name: "Structure Solve",
    });

    let options = DescentOptions {
        max_iterations: config.max_iterations,
        tolerance: config.tolerance,
        verbose: config.verbose,
    };
    let result = optimizer::minimize(objective.as_mut(), start, &options, reporter);

    let report = SolverReport {
        variant: config.variant,
        iterations: result.iterations,
        converged: result.converged,
        initial_objective: result.initial_value,
        objective: result.value,
        beta: objective.beta(),
    };

    if report.converged {
        info!(
            iterations = report.iterations,
            objective = report.objective,
            "Solver converged."
        );
    } else {
        warn!(
            iterations = report.iterations,
            objective = report.objective,
            "Solver stopped without converging."
        );
        reporter.message(format!(
            "{} did not converge within {} iterations.",
            config.variant, config.max_iterations
        ));
    }
    reporter.report(Progress::PhaseFinish);

    Ok(StructureSolution {
        coordinates: CoordinateSet::new(result.points),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::{euclidean_distances, pairwise_distances};
    use crate::core::isotonic::calibrate;
    use crate::engine::config::SolverConfigBuilder;

    fn config(variant: SolverVariant) -> SolverConfig {
        SolverConfigBuilder::new()
            .variant(variant)
            .alpha(-3.0)
            .beta(1.0)
            .max_iterations(2_000)
            .seed(42)
            .build()
            .unwrap()
    }

    fn scenario() -> ContactMatrix {
        ContactMatrix::from_rows(&[
            vec![0.0, 5.0, 2.0, 0.0],
            vec![5.0, 0.0, 3.0, 1.0],
            vec![2.0, 3.0, 0.0, 4.0],
            vec![0.0, 1.0, 4.0, 0.0],
        ])
        .unwrap()
    }

    fn two_beads(count: f64) -> ContactMatrix {
        ContactMatrix::from_rows(&[vec![0.0, count], vec![count, 0.0]]).unwrap()
    }

    fn separation(solution: &StructureSolution) -> f64 {
        euclidean_distances(&solution.coordinates)[(0, 1)]
    }

    #[test]
    fn every_variant_returns_one_point_per_bead() {
        let contacts = scenario();
        for variant in [SolverVariant::Mds, SolverVariant::Pm1, SolverVariant::Pm2] {
            let solution = solve(&contacts, &config(variant), &ProgressReporter::new()).unwrap();
            assert_eq!(solution.coordinates.len(), 4, "{variant}");
            assert_eq!(solution.report.variant, variant);
        }
    }

    #[test]
    fn same_seed_gives_identical_coordinates() {
        let contacts = scenario();
        let cfg = config(SolverVariant::Pm1);
        let a = solve(&contacts, &cfg, &ProgressReporter::new()).unwrap();
        let b = solve(&contacts, &cfg, &ProgressReporter::new()).unwrap();
        assert_eq!(a.coordinates, b.coordinates);
    }

    #[test]
    fn seeded_mds_structure_calibrates_against_its_counts() {
        let contacts = scenario();
        let solution = solve(&contacts, &config(SolverVariant::Mds), &ProgressReporter::new()).unwrap();
        assert_eq!(solution.coordinates.len(), 4);

        let distances = pairwise_distances(&solution.coordinates);
        let wish = calibrate(&contacts, &distances).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                if contacts.get(i, j) == 0.0 {
                    assert_eq!(wish.get(i, j), 0.0, "({i}, {j})");
                } else {
                    assert!(wish.get(i, j) > 0.0, "({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn mds_places_two_beads_at_the_implied_distance() {
        let solution = solve(&two_beads(8.0), &config(SolverVariant::Mds), &ProgressReporter::new()).unwrap();
        assert!((separation(&solution) - 0.5).abs() < 1e-3);
        assert!(solution.report.converged);
    }

    #[test]
    fn pm1_places_two_beads_at_the_likelihood_optimum() {
        // d/dd [d^-3 + 24 ln d] = 0 at d = 0.5.
        let solution = solve(&two_beads(8.0), &config(SolverVariant::Pm1), &ProgressReporter::new()).unwrap();
        assert!((separation(&solution) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn objective_does_not_increase() {
        let contacts = scenario();
        for variant in [SolverVariant::Mds, SolverVariant::Pm1] {
            let solution = solve(&contacts, &config(variant), &ProgressReporter::new()).unwrap();
            assert!(solution.report.objective <= solution.report.initial_objective);
        }
    }

    #[test]
    fn all_zero_counts_are_solvable() {
        let contacts = ContactMatrix::new(DMatrix::zeros(3, 3)).unwrap();
        let solution = solve(&contacts, &config(SolverVariant::Mds), &ProgressReporter::new()).unwrap();
        assert_eq!(solution.coordinates.len(), 3);
        assert!(solution.report.converged);
    }

    #[test]
    fn pm2_reports_an_estimated_beta() {
        let solution = solve(&scenario(), &config(SolverVariant::Pm2), &ProgressReporter::new()).unwrap();
        assert!(solution.report.beta.is_finite());
        assert!(solution.report.beta > 0.0);
    }

    #[test]
    fn unusable_hyperparameters_are_rejected() {
        let mut cfg = config(SolverVariant::Pm1);
        cfg.beta = 0.0;
        let result = solve(&scenario(), &cfg, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::InvalidValue { key: "beta", .. }))
        ));
    }

    #[test]
    fn raw_counts_are_validated() {
        let counts = DMatrix::from_row_slice(2, 3, &[0.0, 1.0, 2.0, 1.0, 0.0, 3.0]);
        let result = solve_counts(counts, &config(SolverVariant::Mds), &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn single_bead_is_returned_unchanged_in_count() {
        let contacts = ContactMatrix::new(DMatrix::zeros(1, 1)).unwrap();
        let solution = solve(&contacts, &config(SolverVariant::Pm2), &ProgressReporter::new()).unwrap();
        assert_eq!(solution.coordinates.len(), 1);
    }
}
