use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Flattened coordinates have {len} values, which is not a multiple of 3")]
    NotMultipleOfThree { len: usize },
    #[error("Expected {expected} values for {beads} beads, found {found}")]
    CountMismatch {
        beads: usize,
        expected: usize,
        found: usize,
    },
}

/// An ordered set of bead positions in 3D.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateSet {
    points: Vec<Point3<f64>>,
}

impl CoordinateSet {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    /// Builds a coordinate set from `x0 y0 z0 x1 y1 z1 ...` given the bead count.
    pub fn from_flat(values: &[f64], beads: usize) -> Result<Self, ShapeError> {
        let expected = beads * 3;
        if values.len() != expected {
            return Err(ShapeError::CountMismatch {
                beads,
                expected,
                found: values.len(),
            });
        }
        let points = values
            .chunks_exact(3)
            .map(|xyz| Point3::new(xyz[0], xyz[1], xyz[2]))
            .collect();
        Ok(Self { points })
    }

    /// Like [`CoordinateSet::from_flat`], with the bead count taken from the
    /// slice length. Lengths that are not a multiple of 3 are rejected.
    pub fn from_flat_inferred(values: &[f64]) -> Result<Self, ShapeError> {
        if values.len() % 3 != 0 {
            return Err(ShapeError::NotMultipleOfThree { len: values.len() });
        }
        Self::from_flat(values, values.len() / 3)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }

    pub fn to_flat(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }
}

impl From<Vec<Point3<f64>>> for CoordinateSet {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_builds_points_in_order() {
        let coords = CoordinateSet::from_flat(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 2).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords.points()[1], Point3::new(3.0, 4.0, 5.0));
        assert_eq!(coords.to_flat(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn from_flat_rejects_mismatched_bead_count() {
        let result = CoordinateSet::from_flat(&[0.0; 6], 3);
        assert_eq!(
            result,
            Err(ShapeError::CountMismatch {
                beads: 3,
                expected: 9,
                found: 6
            })
        );
    }

    #[test]
    fn inferred_reshape_rejects_partial_points() {
        let result = CoordinateSet::from_flat_inferred(&[0.0; 7]);
        assert_eq!(result, Err(ShapeError::NotMultipleOfThree { len: 7 }));
    }

    #[test]
    fn inferred_reshape_accepts_whole_points() {
        let coords = CoordinateSet::from_flat_inferred(&[1.0; 9]).unwrap();
        assert_eq!(coords.len(), 3);
    }
}
