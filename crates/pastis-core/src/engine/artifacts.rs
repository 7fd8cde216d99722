use super::config::SolverVariant;
use super::error::EngineError;
use crate::core::io::contacts::{CountsFile, NpyCountsFile};
use crate::core::io::text::TextFormatError;
use crate::core::io::traits::TextArtifact;
use crate::core::models::contacts::ContactMatrix;
use std::io;
use std::path::{Path, PathBuf};

/// Names every file of a run directory.
///
/// The refinement rounds hand data to the native solver exclusively through
/// these files, so all naming lives here rather than in the workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    directory: PathBuf,
    output_name: String,
}

/// Files touched by one NMDS round `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundArtifacts {
    pub round: usize,
    /// Coordinates the round starts from.
    pub input: PathBuf,
    /// `<i>.NMDS.wish_distances.txt`
    pub wish_distances: PathBuf,
    /// `<i+1>.NMDS.<name>.temp.txt`
    pub seed: PathBuf,
    /// `<i+1>.NMDS.sh`
    pub script: PathBuf,
    /// `<i+1>.NMDS.log`
    pub log: PathBuf,
    /// Value of the solver's `-o` flag, `<i+1>.NMDS.<name>`.
    pub output_prefix: PathBuf,
    /// `<i+1>.NMDS.<name>.txt`, written by the solver.
    pub output: PathBuf,
}

impl ArtifactStore {
    pub fn new(directory: impl Into<PathBuf>, output_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            output_name: output_name.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Resolves a path from the configuration against the run directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.directory.join(path)
    }

    /// `<VARIANT>.<name>.txt`
    pub fn initial_structure(&self, variant: SolverVariant) -> PathBuf {
        self.directory
            .join(format!("{}.{}.txt", variant.label(), self.output_name))
    }

    /// `<i>.NMDS.<name>.txt`
    pub fn round_structure(&self, round: usize) -> PathBuf {
        self.directory
            .join(format!("{}.NMDS.{}.txt", round, self.output_name))
    }

    pub fn round_input(&self, round: usize) -> PathBuf {
        if round == 0 {
            self.initial_structure(SolverVariant::Mds)
        } else {
            self.round_structure(round)
        }
    }

    pub fn round_artifacts(&self, round: usize) -> RoundArtifacts {
        let next = round + 1;
        RoundArtifacts {
            round,
            input: self.round_input(round),
            wish_distances: self
                .directory
                .join(format!("{}.NMDS.wish_distances.txt", round)),
            seed: self
                .directory
                .join(format!("{}.NMDS.{}.temp.txt", next, self.output_name)),
            script: self.directory.join(format!("{}.NMDS.sh", next)),
            log: self.directory.join(format!("{}.NMDS.log", next)),
            output_prefix: self
                .directory
                .join(format!("{}.NMDS.{}", next, self.output_name)),
            output: self.round_structure(next),
        }
    }
}

fn classify(path: &Path, error: TextFormatError) -> EngineError {
    match error {
        TextFormatError::Io(e) if e.kind() == io::ErrorKind::NotFound => {
            EngineError::MissingArtifact {
                path: path.to_path_buf(),
            }
        }
        TextFormatError::Matrix(e) => EngineError::from(e),
        TextFormatError::Shape(e) => EngineError::Shape(e),
        other => EngineError::Artifact {
            path: path.to_path_buf(),
            source: other,
        },
    }
}

/// Reads an artifact, mapping a missing file to `MissingArtifact`.
pub fn load<F>(path: &Path) -> Result<F::Value, EngineError>
where
    F: TextArtifact<Error = TextFormatError>,
{
    F::read_from_path(path).map_err(|e| classify(path, e))
}

/// Reads the contact counts, as a numpy array for `.npy` files and as a dense
/// text matrix otherwise.
pub fn load_counts(path: &Path) -> Result<ContactMatrix, EngineError> {
    let is_npy = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("npy"));
    if is_npy {
        load::<NpyCountsFile>(path)
    } else {
        load::<CountsFile>(path)
    }
}

pub fn save<F>(value: &F::Value, path: &Path) -> Result<(), EngineError>
where
    F: TextArtifact<Error = TextFormatError>,
{
    F::write_to_path(value, path).map_err(|e| classify(path, e))
}

pub fn copy_artifact(from: &Path, to: &Path) -> Result<(), EngineError> {
    std::fs::copy(from, to).map(|_| ()).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound && !from.exists() {
            EngineError::MissingArtifact {
                path: from.to_path_buf(),
            }
        } else {
            EngineError::Io {
                path: to.to_path_buf(),
                source: e,
            }
        }
    })
}
