//! # Engine Module
//!
//! Computational machinery behind the PASTIS workflows: the structure solvers,
//! the bridge to the native refinement binaries, and the file naming that
//! connects consecutive refinement rounds.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Solver and refinement parameters with validating builders
//! - **Structure Solver** ([`solver`]) - MDS, PM1 and PM2 objectives minimised by gradient descent
//! - **Solver Bridge** ([`bridge`]) - Command rendering, script generation and process supervision
//! - **Artifacts** ([`artifacts`]) - Run-directory file names and typed load/save helpers
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The engine-wide error type

pub mod artifacts;
pub mod bridge;
pub mod config;
pub mod error;
pub mod progress;
pub mod solver;
