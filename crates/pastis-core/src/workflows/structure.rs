use crate::core::io::coordinates::CoordinatesFile;
use crate::core::models::contacts::ContactMatrix;
use crate::engine::artifacts::{self, ArtifactStore};
use crate::engine::config::SolverConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solver::{self, StructureSolution};
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct StructureResult {
    pub solution: StructureSolution,
    /// Where the coordinates were written.
    pub path: PathBuf,
}

#[instrument(skip_all, name = "structure_workflow", fields(variant = %config.variant))]
pub fn run(
    store: &ArtifactStore,
    contacts: &ContactMatrix,
    config: &SolverConfig,
    reporter: &ProgressReporter,
) -> Result<StructureResult, EngineError> {
    let solution = solver::solve(contacts, config, reporter)?;

    reporter.report(Progress::PhaseStart {
        name: "Writing Structure",
    });
    let path = store.initial_structure(config.variant);
    artifacts::save::<CoordinatesFile>(&solution.coordinates, &path)?;
    reporter.report(Progress::PhaseFinish);

    info!(path = %path.display(), "Structure written.");
    Ok(StructureResult { solution, path })
}
