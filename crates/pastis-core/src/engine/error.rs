use super::config::ConfigError;
use crate::core::io::text::TextFormatError;
use crate::core::isotonic::CalibrationError;
use crate::core::models::contacts::MatrixError;
use crate::core::models::coordinates::ShapeError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Coordinate shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Nothing to calibrate: {0}")]
    EmptyInput(String),

    #[error("Expected artifact is missing: {path}", path = .path.display())]
    MissingArtifact { path: PathBuf },

    #[error(
        "Solver process failed with exit code {code} (see log '{log}')",
        code = describe_exit_code(.code),
        log = .log.display()
    )]
    SolverProcess { code: Option<i32>, log: PathBuf },

    #[error("Solver process exceeded {timeout:?} and was killed (see log '{log}')", log = .log.display())]
    SolverTimeout { timeout: Duration, log: PathBuf },

    #[error("Failed to process artifact '{path}': {source}", path = .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: TextFormatError,
    },

    #[error("I/O error on '{path}': {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn describe_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "<terminated by signal>".to_string(),
    }
}

impl From<MatrixError> for EngineError {
    fn from(e: MatrixError) -> Self {
        EngineError::InvalidInput(e.to_string())
    }
}

impl From<CalibrationError> for EngineError {
    fn from(e: CalibrationError) -> Self {
        match e {
            CalibrationError::Empty => EngineError::EmptyInput(e.to_string()),
            other => EngineError::InvalidInput(other.to_string()),
        }
    }
}
