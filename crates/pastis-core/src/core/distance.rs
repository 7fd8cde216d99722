use crate::core::models::DistanceMatrix;
use crate::core::models::coordinates::CoordinateSet;
use nalgebra::DMatrix;

/// Conversion from model units to the distance unit used by calibration and
/// by the native solvers.
pub const DISTANCE_SCALE: f64 = 1000.0;

/// Euclidean distances between every pair of beads, in model units.
pub fn euclidean_distances(coords: &CoordinateSet) -> DistanceMatrix {
    let points = coords.points();
    let n = points.len();
    let mut distances = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = nalgebra::distance(&points[i], &points[j]);
            distances[(i, j)] = d;
            distances[(j, i)] = d;
        }
    }
    distances
}

/// Pairwise distances scaled by [`DISTANCE_SCALE`].
pub fn pairwise_distances(coords: &CoordinateSet) -> DistanceMatrix {
    euclidean_distances(coords) * DISTANCE_SCALE
}
