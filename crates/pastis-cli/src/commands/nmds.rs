use super::solve;
use crate::cli::NmdsArgs;
use crate::config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use pastis::engine::bridge::ScriptLauncher;
use pastis::engine::progress::ProgressReporter;
use pastis::workflows::nmds::{self, RefinementInputs, RefinementOutcome};
use tracing::{info, warn};

pub fn run(args: NmdsArgs) -> Result<()> {
    let config = config::build_refinement_config(&args)?;
    let app = &config.app;

    info!(
        "Loading contact counts from {:?} and organism structure from {:?}",
        &app.counts_path, &app.organism_path
    );
    let inputs = RefinementInputs::load(&app.counts_path, &app.organism_path)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    if config.initial_solve {
        println!("Solving MDS structure for {} beads...", inputs.contacts.size());
        solve::solve_and_write(app, &inputs.contacts, &reporter)?;
    } else {
        info!("Reusing the existing MDS structure.");
    }

    println!(
        "Running {} NMDS round(s) with {}...",
        config.refinement.rounds,
        config.refinement.binary.display()
    );
    let launcher = ScriptLauncher::new(config.refinement.timeout);
    let outcome = nmds::run(
        &app.store,
        &inputs,
        &config.refinement,
        &launcher,
        &reporter,
    )?;

    match outcome {
        RefinementOutcome::Skipped { missing } => {
            warn!("Refinement skipped: {} does not exist.", missing.display());
            println!(
                "Warning: {} not found, no NMDS round was run.",
                missing.display()
            );
        }
        RefinementOutcome::Completed { rounds } => match rounds.last() {
            Some(last) => println!(
                "✓ {} NMDS round(s) complete. Final structure: {}",
                rounds.len(),
                last.artifacts.output.display()
            ),
            None => println!("No NMDS rounds were requested."),
        },
    }
    Ok(())
}
