use crate::core::distance::pairwise_distances;
use crate::core::io::coordinates::CoordinatesFile;
use crate::core::io::organism::OrganismFile;
use crate::core::io::wish::WishDistancesFile;
use crate::core::isotonic::calibrate;
use crate::core::models::contacts::ContactMatrix;
use crate::core::models::coordinates::ShapeError;
use crate::core::models::organism::OrganismStructure;
use crate::engine::artifacts::{self, ArtifactStore, RoundArtifacts};
use crate::engine::bridge::{SolverInvocation, SolverLauncher, SolverOutcome, write_script};
use crate::engine::config::{ExitStatusPolicy, RefinementConfig, SolverVariant};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Data that stays fixed across all rounds.
#[derive(Debug, Clone)]
pub struct RefinementInputs {
    pub contacts: ContactMatrix,
    pub organism: OrganismStructure,
    /// Passed to the native solver as `-k`.
    pub organism_path: PathBuf,
}

impl RefinementInputs {
    /// Loads the count matrix and organism structure once for the whole run.
    pub fn load(counts_path: &Path, organism_path: &Path) -> Result<Self, EngineError> {
        Ok(Self {
            contacts: artifacts::load_counts(counts_path)?,
            organism: artifacts::load::<OrganismFile>(organism_path)?,
            organism_path: organism_path.to_path_buf(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    pub artifacts: RoundArtifacts,
    pub outcome: SolverOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefinementOutcome {
    /// The MDS structure the rounds start from does not exist; nothing was written.
    Skipped { missing: PathBuf },
    Completed { rounds: Vec<RoundRecord> },
}

#[instrument(skip_all, name = "nmds_workflow", fields(rounds = config.rounds))]
pub fn run<L>(
    store: &ArtifactStore,
    inputs: &RefinementInputs,
    config: &RefinementConfig,
    launcher: &L,
    reporter: &ProgressReporter,
) -> Result<RefinementOutcome, EngineError>
where
    L: SolverLauncher + ?Sized,
{
    let initial = store.initial_structure(SolverVariant::Mds);
    if !initial.is_file() {
        warn!(
            path = %initial.display(),
            "MDS structure not found; skipping NMDS refinement."
        );
        return Ok(RefinementOutcome::Skipped { missing: initial });
    }

    let mut rounds = Vec::with_capacity(config.rounds);
    for round in 0..config.rounds {
        reporter.report(Progress::RoundStart {
            round,
            total: config.rounds,
        });
        let record = run_round(store, inputs, config, launcher, reporter, round)?;
        reporter.report(Progress::RoundFinish {
            round,
            exit_code: record.outcome.exit_code,
        });
        rounds.push(record);
    }

    info!(rounds = rounds.len(), "NMDS refinement complete.");
    Ok(RefinementOutcome::Completed { rounds })
}

#[instrument(skip_all, fields(round = round))]
fn run_round<L>(
    store: &ArtifactStore,
    inputs: &RefinementInputs,
    config: &RefinementConfig,
    launcher: &L,
    reporter: &ProgressReporter,
    round: usize,
) -> Result<RoundRecord, EngineError>
where
    L: SolverLauncher + ?Sized,
{
    let files = store.round_artifacts(round);
    let beads = inputs.contacts.size();

    let coordinates = artifacts::load::<CoordinatesFile>(&files.input)?;
    if coordinates.len() != beads {
        return Err(EngineError::Shape(ShapeError::CountMismatch {
            beads,
            expected: beads * 3,
            found: coordinates.len() * 3,
        }));
    }
    let distances = pairwise_distances(&coordinates);

    reporter.message("Fitting isotonic regression...");
    let wish = calibrate(&inputs.contacts, &distances)?;

    reporter.message("Writing wish distances");
    WishDistancesFile::write_to_path(
        &wish,
        &inputs.organism,
        config.resolution,
        &files.wish_distances,
    )
    .map_err(|source| EngineError::Artifact {
        path: files.wish_distances.clone(),
        source,
    })?;
    artifacts::copy_artifact(&files.input, &files.seed)?;

    let invocation = SolverInvocation {
        binary: config.binary.clone(),
        output: files.output_prefix.clone(),
        resolution: config.resolution,
        organism_structure: inputs.organism_path.clone(),
        wish_distances: files.wish_distances.clone(),
        hyperparameters: config.hyperparameters.clone(),
        log: files.log.clone(),
        script: files.script.clone(),
    };
    write_script(&invocation)?;
    debug!(script = %files.script.display(), "Solver script written.");

    reporter.message("Running native solver");
    let outcome = launcher.launch(&invocation)?;
    if !outcome.is_success() {
        match config.exit_status_policy {
            ExitStatusPolicy::Fail => {
                return Err(EngineError::SolverProcess {
                    code: outcome.exit_code,
                    log: outcome.log,
                });
            }
            ExitStatusPolicy::Warn => warn!(
                exit_code = ?outcome.exit_code,
                log = %outcome.log.display(),
                "Native solver exited unsuccessfully; continuing."
            ),
        }
    }
    if config.exit_status_policy == ExitStatusPolicy::Fail && !files.output.is_file() {
        return Err(EngineError::MissingArtifact {
            path: files.output.clone(),
        });
    }

    Ok(RoundRecord {
        artifacts: files,
        outcome,
    })
}
