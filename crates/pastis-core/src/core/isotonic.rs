use crate::core::models::DistanceMatrix;
use crate::core::models::contacts::ContactMatrix;
use crate::core::models::wish::WishDistances;
use nalgebra::DMatrix;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("No nonzero contact counts to fit the isotonic regression on")]
    Empty,
    #[error("Input lengths differ: {x} predictors and {y} responses")]
    LengthMismatch { x: usize, y: usize },
    #[error("Distance matrix is {distances}x{distances} but the contact matrix is {contacts}x{contacts}")]
    SizeMismatch { contacts: usize, distances: usize },
    #[error("Non-finite value at position {0}")]
    NonFinite(usize),
}

#[derive(Debug, Clone, Copy)]
struct Block {
    sum: f64,
    weight: f64,
    len: usize,
}

impl Block {
    #[inline]
    fn mean(&self) -> f64 {
        self.sum / self.weight
    }

    fn absorb(&mut self, other: Block) {
        self.sum += other.sum;
        self.weight += other.weight;
        self.len += other.len;
    }
}

/// Least-squares non-decreasing fit of `y` against `x` (pool adjacent violators).
///
/// Returns the fitted value for each input position, in input order. Points
/// sharing the same `x` are pooled before fitting and receive the same value.
pub fn isotonic_regression(x: &[f64], y: &[f64]) -> Result<Vec<f64>, CalibrationError> {
    if x.len() != y.len() {
        return Err(CalibrationError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.is_empty() {
        return Err(CalibrationError::Empty);
    }
    if let Some(pos) = (0..x.len()).find(|&k| !x[k].is_finite() || !y[k].is_finite()) {
        return Err(CalibrationError::NonFinite(pos));
    }

    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

    let mut stack: Vec<Block> = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && x[order[end]] == x[order[start]] {
            end += 1;
        }
        let mut block = Block {
            sum: order[start..end].iter().map(|&k| y[k]).sum(),
            weight: (end - start) as f64,
            len: end - start,
        };
        while let Some(mut prev) = stack.pop() {
            if prev.mean() <= block.mean() {
                stack.push(prev);
                break;
            }
            prev.absorb(block);
            block = prev;
        }
        stack.push(block);
        start = end;
    }

    let mut fitted = vec![0.0; x.len()];
    let mut pos = 0;
    for block in &stack {
        let mean = block.mean();
        for &k in &order[pos..pos + block.len] {
            fitted[k] = mean;
        }
        pos += block.len;
    }
    Ok(fitted)
}

/// Maps observed distances onto a monotone function of `1 / count`.
///
/// Only index pairs with a nonzero count take part; every other entry of the
/// result is zero.
#[instrument(level = "debug", skip_all, fields(beads = contacts.size()))]
pub fn calibrate(
    contacts: &ContactMatrix,
    distances: &DistanceMatrix,
) -> Result<WishDistances, CalibrationError> {
    let n = contacts.size();
    if distances.nrows() != n || distances.ncols() != n {
        return Err(CalibrationError::SizeMismatch {
            contacts: n,
            distances: distances.nrows(),
        });
    }

    let entries: Vec<(usize, usize, f64)> = contacts.nonzero_entries().collect();
    if entries.is_empty() {
        return Err(CalibrationError::Empty);
    }

    let inverse_counts: Vec<f64> = entries.iter().map(|&(_, _, c)| 1.0 / c).collect();
    let observed: Vec<f64> = entries.iter().map(|&(i, j, _)| distances[(i, j)]).collect();
    let fitted = isotonic_regression(&inverse_counts, &observed)?;

    let mut wish = DMatrix::zeros(n, n);
    for (&(i, j, _), value) in entries.iter().zip(fitted) {
        wish[(i, j)] = value;
    }
    debug!(pairs = entries.len(), "Isotonic calibration finished.");
    Ok(WishDistances::from_matrix(wish))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < TOLERANCE, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn already_monotone_input_is_unchanged() {
        let fitted = isotonic_regression(&[1.0, 2.0, 3.0], &[1.0, 2.0, 5.0]).unwrap();
        assert_all_close(&fitted, &[1.0, 2.0, 5.0]);
    }

    #[test]
    fn adjacent_violators_are_pooled() {
        let fitted = isotonic_regression(&[1.0, 2.0, 3.0, 4.0], &[1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_all_close(&fitted, &[1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn pooling_cascades_backwards() {
        let fitted = isotonic_regression(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert_all_close(&fitted, &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn unsorted_input_is_fitted_in_input_order() {
        let fitted = isotonic_regression(&[3.0, 1.0, 2.0], &[4.0, 1.0, 6.0]).unwrap();
        assert_all_close(&fitted, &[5.0, 1.0, 5.0]);
    }

    #[test]
    fn tied_predictors_receive_equal_values() {
        let fitted = isotonic_regression(&[1.0, 1.0, 2.0], &[3.0, 1.0, 5.0]).unwrap();
        assert_all_close(&fitted, &[2.0, 2.0, 5.0]);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = isotonic_regression(&[1.0, 2.0], &[1.0]);
        assert_eq!(result, Err(CalibrationError::LengthMismatch { x: 2, y: 1 }));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(isotonic_regression(&[], &[]), Err(CalibrationError::Empty));
    }

    #[test]
    fn calibrate_keeps_zero_count_entries_at_zero() {
        let contacts = ContactMatrix::from_rows(&[
            vec![0.0, 4.0, 1.0],
            vec![4.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
        ])
        .unwrap();
        let distances = DMatrix::from_row_slice(
            3,
            3,
            &[0.0, 900.0, 500.0, 900.0, 0.0, 300.0, 500.0, 300.0, 0.0],
        );

        let wish = calibrate(&contacts, &distances).unwrap();

        assert_eq!(wish.get(1, 2), 0.0);
        assert_eq!(wish.get(0, 0), 0.0);
        // 1/4 maps to 900 and 1/1 to 500: the violation is pooled to 700.
        assert!((wish.get(0, 1) - 700.0).abs() < TOLERANCE);
        assert!((wish.get(0, 2) - 700.0).abs() < TOLERANCE);
    }

    #[test]
    fn calibrated_values_increase_with_inverse_count() {
        let contacts = ContactMatrix::from_rows(&[
            vec![0.0, 9.0, 3.0, 1.0],
            vec![9.0, 0.0, 6.0, 2.0],
            vec![3.0, 6.0, 0.0, 5.0],
            vec![1.0, 2.0, 5.0, 0.0],
        ])
        .unwrap();
        let raw = DMatrix::from_fn(4, 4, |i, j| 100.0 * ((i * 7 + j * 3) % 5) as f64 + 50.0);
        let mut distances = (&raw + raw.transpose()) * 0.5;
        distances.fill_diagonal(0.0);

        let wish = calibrate(&contacts, &distances).unwrap();

        let mut pairs: Vec<(f64, f64)> = contacts
            .nonzero_entries()
            .map(|(i, j, c)| (1.0 / c, wish.get(i, j)))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        for window in pairs.windows(2) {
            assert!(window[0].1 <= window[1].1 + TOLERANCE);
        }
    }

    #[test]
    fn calibrate_without_contacts_is_an_error() {
        let contacts = ContactMatrix::new(DMatrix::zeros(3, 3)).unwrap();
        let result = calibrate(&contacts, &DMatrix::zeros(3, 3));
        assert_eq!(result, Err(CalibrationError::Empty));
    }

    #[test]
    fn calibrate_rejects_mismatched_distance_matrix() {
        let contacts = ContactMatrix::from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let result = calibrate(&contacts, &DMatrix::zeros(3, 3));
        assert_eq!(
            result,
            Err(CalibrationError::SizeMismatch {
                contacts: 2,
                distances: 3
            })
        );
    }
}
