//! Data models for contact counts, bead coordinates and genome layout.

pub mod contacts;
pub mod coordinates;
pub mod organism;
pub mod wish;

use nalgebra::DMatrix;

/// Pairwise distances between beads, `n×n`, symmetric with a zero diagonal.
pub type DistanceMatrix = DMatrix<f64>;
