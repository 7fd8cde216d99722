//! # Workflows Module
//!
//! Top-level procedures that tie the engine to a run directory.
//!
//! ## Architecture
//!
//! - **Structure Workflow** ([`structure`]) - Solves an initial structure with one
//!   of the MDS, PM1 or PM2 objectives and writes `<VARIANT>.<name>.txt`.
//! - **Refinement Workflow** ([`nmds`]) - Runs the NMDS rounds on top of the MDS
//!   structure: calibrate wish distances, hand them to the native solver, repeat.
//!
//! Both workflows report through [`crate::engine::progress::ProgressReporter`]
//! and persist every intermediate result through
//! [`crate::engine::artifacts::ArtifactStore`].

pub mod nmds;
pub mod structure;
