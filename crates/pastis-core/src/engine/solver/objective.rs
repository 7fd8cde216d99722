use crate::core::models::contacts::ContactMatrix;
use nalgebra::{DMatrix, Point3, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Floor applied to pair distances so that `ln d` and `d^alpha` stay finite.
const MIN_DISTANCE: f64 = 1e-10;

/// Distance implied by a count under `count = beta * distance^alpha`.
#[inline]
pub(crate) fn implied_distance(count: f64, alpha: f64, beta: f64) -> f64 {
    (count / beta).powf(1.0 / alpha)
}

/// A sum of per-pair terms over ordered bead pairs `i != j`.
pub(crate) trait Objective: Sync {
    fn pair_term(&self, i: usize, j: usize, distance: f64) -> f64;

    /// Derivative of [`Objective::pair_term`] with respect to the distance.
    fn pair_slope(&self, i: usize, j: usize, distance: f64) -> f64;

    /// Re-estimates free parameters for the current structure. Returns `true`
    /// when the objective changed.
    fn refit(&mut self, _points: &[Point3<f64>]) -> bool {
        false
    }

    fn beta(&self) -> f64;

    /// Typical target distance, used to size the random initial structure.
    fn length_scale(&self) -> f64;
}

#[inline]
fn pair_distance(points: &[Point3<f64>], i: usize, j: usize) -> f64 {
    nalgebra::distance(&points[i], &points[j]).max(MIN_DISTANCE)
}

pub(crate) fn value(objective: &dyn Objective, points: &[Point3<f64>]) -> f64 {
    let n = points.len();

    #[cfg(not(feature = "parallel"))]
    let rows = 0..n;

    #[cfg(feature = "parallel")]
    let rows = (0..n).into_par_iter();

    let row_values: Vec<f64> = rows
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| objective.pair_term(i, j, pair_distance(points, i, j)))
                .sum()
        })
        .collect();
    row_values.iter().sum()
}

/// Gradient with respect to every bead position. Row `i` collects both the
/// `(i, j)` and `(j, i)` terms, so rows are independent of each other.
pub(crate) fn gradient(objective: &dyn Objective, points: &[Point3<f64>]) -> Vec<Vector3<f64>> {
    let n = points.len();

    #[cfg(not(feature = "parallel"))]
    let rows = 0..n;

    #[cfg(feature = "parallel")]
    let rows = (0..n).into_par_iter();

    rows.map(|i| {
        let mut grad = Vector3::zeros();
        for j in (0..n).filter(|&j| j != i) {
            let delta = points[i] - points[j];
            let distance = pair_distance(points, i, j);
            let slope = objective.pair_slope(i, j, distance) + objective.pair_slope(j, i, distance);
            grad += delta * (slope / distance);
        }
        grad
    })
    .collect()
}

fn mean_implied_distance(contacts: &ContactMatrix, alpha: f64, beta: f64) -> f64 {
    let (sum, count) = contacts
        .nonzero_entries()
        .filter(|&(i, j, _)| i != j)
        .fold((0.0, 0usize), |(sum, count), (_, _, c)| {
            (sum + implied_distance(c, alpha, beta), count + 1)
        });
    if count == 0 || !sum.is_finite() {
        1.0
    } else {
        sum / count as f64
    }
}

/// Weighted metric stress `(d - w)^2 / w^2` over pairs with a nonzero count.
pub(crate) struct StressObjective {
    wish: DMatrix<f64>,
    beta: f64,
    scale: f64,
}

impl StressObjective {
    pub(crate) fn new(contacts: &ContactMatrix, alpha: f64, beta: f64) -> Self {
        let wish = contacts.as_matrix().map(|c| {
            if c > 0.0 {
                implied_distance(c, alpha, beta)
            } else {
                0.0
            }
        });
        Self {
            wish,
            beta,
            scale: mean_implied_distance(contacts, alpha, beta),
        }
    }
}

impl Objective for StressObjective {
    #[inline]
    fn pair_term(&self, i: usize, j: usize, distance: f64) -> f64 {
        let w = self.wish[(i, j)];
        if w == 0.0 {
            return 0.0;
        }
        let diff = distance - w;
        diff * diff / (w * w)
    }

    #[inline]
    fn pair_slope(&self, i: usize, j: usize, distance: f64) -> f64 {
        let w = self.wish[(i, j)];
        if w == 0.0 {
            return 0.0;
        }
        2.0 * (distance - w) / (w * w)
    }

    fn beta(&self) -> f64 {
        self.beta
    }

    fn length_scale(&self) -> f64 {
        self.scale
    }
}

/// Poisson negative log-likelihood of the counts with intensity `beta * d^alpha`.
pub(crate) struct PoissonObjective<'a> {
    contacts: &'a ContactMatrix,
    alpha: f64,
    beta: f64,
    estimate_beta: bool,
    scale: f64,
}

impl<'a> PoissonObjective<'a> {
    pub(crate) fn new(contacts: &'a ContactMatrix, alpha: f64, beta: f64, estimate_beta: bool) -> Self {
        Self {
            contacts,
            alpha,
            beta,
            estimate_beta,
            scale: mean_implied_distance(contacts, alpha, beta),
        }
    }
}

impl Objective for PoissonObjective<'_> {
    #[inline]
    fn pair_term(&self, i: usize, j: usize, distance: f64) -> f64 {
        let c = self.contacts.get(i, j);
        let intensity = self.beta * distance.powf(self.alpha);
        if c == 0.0 {
            intensity
        } else {
            intensity - c * (self.alpha * distance.ln() + self.beta.ln())
        }
    }

    #[inline]
    fn pair_slope(&self, i: usize, j: usize, distance: f64) -> f64 {
        let c = self.contacts.get(i, j);
        self.alpha * self.beta * distance.powf(self.alpha - 1.0) - c * self.alpha / distance
    }

    /// Closed-form maximum-likelihood `beta` for the current distances.
    fn refit(&mut self, points: &[Point3<f64>]) -> bool {
        if !self.estimate_beta {
            return false;
        }
        let total = self.contacts.off_diagonal_total();
        let n = points.len();
        let mut intensity_sum = 0.0;
        for i in 0..n {
            for j in (0..n).filter(|&j| j != i) {
                intensity_sum += pair_distance(points, i, j).powf(self.alpha);
            }
        }
        let beta = total / intensity_sum;
        if total > 0.0 && beta.is_finite() && beta > 0.0 {
            self.beta = beta;
            true
        } else {
            false
        }
    }

    fn beta(&self) -> f64 {
        self.beta
    }

    fn length_scale(&self) -> f64 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_beads(count: f64) -> ContactMatrix {
        ContactMatrix::from_rows(&[vec![0.0, count], vec![count, 0.0]]).unwrap()
    }

    fn finite_difference(objective: &dyn Objective, points: &[Point3<f64>]) -> Vec<Vector3<f64>> {
        let h = 1e-6;
        (0..points.len())
            .map(|i| {
                let mut grad = Vector3::zeros();
                for axis in 0..3 {
                    let mut plus = points.to_vec();
                    let mut minus = points.to_vec();
                    plus[i][axis] += h;
                    minus[i][axis] -= h;
                    grad[axis] = (value(objective, &plus) - value(objective, &minus)) / (2.0 * h);
                }
                grad
            })
            .collect()
    }

    fn sample_points() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.1, 0.2),
            Point3::new(0.7, -0.2, 0.1),
            Point3::new(0.3, 0.9, -0.4),
        ]
    }

    fn sample_contacts() -> ContactMatrix {
        ContactMatrix::from_rows(&[
            vec![0.0, 5.0, 2.0],
            vec![5.0, 0.0, 0.0],
            vec![2.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    fn assert_gradients_match(objective: &dyn Objective) {
        let points = sample_points();
        let analytic = gradient(objective, &points);
        let numeric = finite_difference(objective, &points);
        for (a, n) in analytic.iter().zip(&numeric) {
            assert!((a - n).norm() < 1e-4, "analytic {a:?} vs numeric {n:?}");
        }
    }

    #[test]
    fn implied_distance_inverts_the_power_law() {
        assert!((implied_distance(8.0, -3.0, 1.0) - 0.5).abs() < 1e-12);
        assert!((implied_distance(16.0, -2.0, 4.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn stress_is_zero_at_the_wish_distance() {
        let contacts = two_beads(8.0);
        let objective = StressObjective::new(&contacts, -3.0, 1.0);
        let points = vec![Point3::origin(), Point3::new(0.5, 0.0, 0.0)];
        assert!(value(&objective, &points).abs() < 1e-12);
    }

    #[test]
    fn stress_gradient_matches_finite_differences() {
        let contacts = sample_contacts();
        assert_gradients_match(&StressObjective::new(&contacts, -3.0, 1.0));
    }

    #[test]
    fn poisson_gradient_matches_finite_differences() {
        let contacts = sample_contacts();
        assert_gradients_match(&PoissonObjective::new(&contacts, -3.0, 1.5, false));
    }

    #[test]
    fn beta_refit_matches_total_counts() {
        let contacts = two_beads(8.0);
        let mut objective = PoissonObjective::new(&contacts, -3.0, 1.0, true);
        let points = vec![Point3::origin(), Point3::new(2.0, 0.0, 0.0)];

        assert!(objective.refit(&points));
        // Two ordered pairs, each with count 8 and d^alpha = 1/8.
        assert!((objective.beta() - 64.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_beta_is_never_refit() {
        let contacts = two_beads(8.0);
        let mut objective = PoissonObjective::new(&contacts, -3.0, 1.0, false);
        assert!(!objective.refit(&[Point3::origin(), Point3::new(2.0, 0.0, 0.0)]));
        assert_eq!(objective.beta(), 1.0);
    }

    #[test]
    fn length_scale_defaults_to_one_without_contacts() {
        let contacts = ContactMatrix::new(DMatrix::zeros(3, 3)).unwrap();
        let objective = StressObjective::new(&contacts, -3.0, 1.0);
        assert_eq!(objective.length_scale(), 1.0);
    }
}
