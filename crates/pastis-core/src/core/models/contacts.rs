use nalgebra::DMatrix;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatrixError {
    #[error("Contact matrix is empty")]
    Empty,
    #[error("Contact matrix must be square, got {rows} rows and {cols} columns")]
    NotSquare { rows: usize, cols: usize },
    #[error("Negative contact count {value} at ({row}, {col})")]
    NegativeEntry { row: usize, col: usize, value: f64 },
    #[error("Infinite contact count at ({row}, {col})")]
    Infinite { row: usize, col: usize },
}

/// A validated Hi-C contact-count matrix.
///
/// Missing observations (NaN) are replaced by zero when the matrix is built,
/// so every consumer sees a square, finite, non-negative matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMatrix {
    counts: DMatrix<f64>,
}

impl ContactMatrix {
    pub fn new(mut counts: DMatrix<f64>) -> Result<Self, MatrixError> {
        let (rows, cols) = counts.shape();
        if rows == 0 || cols == 0 {
            return Err(MatrixError::Empty);
        }
        if rows != cols {
            return Err(MatrixError::NotSquare { rows, cols });
        }

        let mut replaced = 0usize;
        for col in 0..cols {
            for row in 0..rows {
                let value = &mut counts[(row, col)];
                if value.is_nan() {
                    *value = 0.0;
                    replaced += 1;
                } else if value.is_infinite() {
                    return Err(MatrixError::Infinite { row, col });
                } else if *value < 0.0 {
                    return Err(MatrixError::NegativeEntry {
                        row,
                        col,
                        value: *value,
                    });
                }
            }
        }

        if replaced > 0 {
            debug!(replaced, "Replaced missing contact counts with zero.");
        }
        Ok(Self { counts })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MatrixError> {
        let n = rows.len();
        if n == 0 {
            return Err(MatrixError::Empty);
        }
        if let Some(bad) = rows.iter().find(|row| row.len() != n) {
            return Err(MatrixError::NotSquare {
                rows: n,
                cols: bad.len(),
            });
        }
        Self::new(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
    }

    /// Number of beads.
    pub fn size(&self) -> usize {
        self.counts.nrows()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.counts[(row, col)]
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.counts
    }

    /// Every entry with a nonzero count, in row-major order, both triangles.
    pub fn nonzero_entries(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.size();
        (0..n).flat_map(move |i| {
            (0..n).filter_map(move |j| {
                let c = self.counts[(i, j)];
                (c != 0.0).then_some((i, j, c))
            })
        })
    }

    /// Sum of the off-diagonal counts.
    pub fn off_diagonal_total(&self) -> f64 {
        self.nonzero_entries()
            .filter(|&(i, j, _)| i != j)
            .map(|(_, _, c)| c)
            .sum()
    }

    pub fn is_symmetric(&self) -> bool {
        self.counts == self.counts.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_entries_are_replaced_with_zero() {
        let matrix = ContactMatrix::from_rows(&[
            vec![0.0, f64::NAN, 2.0],
            vec![f64::NAN, 0.0, 3.0],
            vec![2.0, 3.0, 0.0],
        ])
        .unwrap();

        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.get(1, 0), 0.0);
        assert_eq!(matrix.get(1, 2), 3.0);
        assert!(matrix.as_matrix().iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let result = ContactMatrix::new(DMatrix::zeros(0, 0));
        assert_eq!(result, Err(MatrixError::Empty));
    }

    #[test]
    fn non_square_matrix_is_rejected() {
        let result = ContactMatrix::new(DMatrix::zeros(2, 3));
        assert_eq!(result, Err(MatrixError::NotSquare { rows: 2, cols: 3 }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = ContactMatrix::from_rows(&[vec![0.0, 1.0], vec![1.0]]);
        assert!(matches!(result, Err(MatrixError::NotSquare { .. })));
    }

    #[test]
    fn negative_entry_is_rejected() {
        let result = ContactMatrix::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]]);
        assert_eq!(
            result,
            Err(MatrixError::NegativeEntry {
                row: 1,
                col: 0,
                value: -1.0
            })
        );
    }

    #[test]
    fn infinite_entry_is_rejected() {
        let result = ContactMatrix::from_rows(&[vec![0.0, f64::INFINITY], vec![1.0, 0.0]]);
        assert_eq!(result, Err(MatrixError::Infinite { row: 0, col: 1 }));
    }

    #[test]
    fn nonzero_entries_cover_both_triangles() {
        let matrix =
            ContactMatrix::from_rows(&[vec![0.0, 5.0, 0.0], vec![5.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]])
                .unwrap();
        let entries: Vec<_> = matrix.nonzero_entries().collect();
        assert_eq!(
            entries,
            vec![(0, 1, 5.0), (1, 0, 5.0), (1, 2, 1.0), (2, 1, 1.0)]
        );
        assert_eq!(matrix.off_diagonal_total(), 12.0);
        assert!(matrix.is_symmetric());
    }
}
