//! Stateless building blocks of the pipeline.
//!
//! This module holds the data models shared by every stage, the two pure
//! numeric transforms applied in each refinement round (the distance engine
//! and the isotonic calibrator) and the readers and writers for the text
//! artifacts exchanged with the native solvers.

pub mod distance;
pub mod io;
pub mod isotonic;
pub mod models;
