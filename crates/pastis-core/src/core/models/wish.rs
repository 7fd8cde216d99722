use nalgebra::DMatrix;

/// Calibrated target distances handed to the native solver.
///
/// Entries are nonzero only where the contact matrix was nonzero.
#[derive(Debug, Clone, PartialEq)]
pub struct WishDistances {
    matrix: DMatrix<f64>,
}

impl WishDistances {
    pub(crate) fn from_matrix(matrix: DMatrix<f64>) -> Self {
        Self { matrix }
    }

    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Nonzero entries with `row <= col`, row-major.
    pub fn upper_triangle_entries(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.size();
        (0..n).flat_map(move |i| {
            (i..n).filter_map(move |j| {
                let v = self.matrix[(i, j)];
                (v != 0.0).then_some((i, j, v))
            })
        })
    }
}
