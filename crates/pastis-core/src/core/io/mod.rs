//! Readers and writers for the plain-text artifacts of a run.
//!
//! Every file exchanged between rounds, or with the native solvers, is a
//! whitespace-separated text file: contact counts, bead coordinates, organism
//! segment lengths and wish distances. The formats share one trait-based
//! interface ([`traits::TextArtifact`]) and one tokenizer ([`text`]).

pub mod contacts;
pub mod coordinates;
pub mod organism;
pub mod text;
pub mod traits;
pub mod wish;
