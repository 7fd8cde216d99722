//! # PASTIS Core Library
//!
//! Inference of 3D chromosome structures from Hi-C contact-count matrices.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Immutable data models (`ContactMatrix`,
//!   `CoordinateSet`, `OrganismStructure`), the pure numeric transforms
//!   (pairwise distances, isotonic calibration) and the text artifact formats.
//!
//! - **[`engine`]: The Logic Core.** The structure solvers (MDS, PM1, PM2),
//!   the typed artifact store that names every round's files, and the bridge
//!   that dispatches the external native solver.
//!
//! - **[`workflows`]: The Public API.** Complete procedures: fitting an initial
//!   structure and running the NMDS refinement rounds on top of it.

pub mod core;
pub mod engine;
pub mod workflows;
