use crate::cli::RunArgs;
use crate::config::{self, AppConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use pastis::core::models::contacts::ContactMatrix;
use pastis::engine::artifacts;
use pastis::engine::config::SolverVariant;
use pastis::engine::progress::ProgressReporter;
use pastis::workflows::structure::{self, StructureResult};
use tracing::info;

pub fn run(args: RunArgs, variant: SolverVariant) -> Result<()> {
    let app = config::build_config(&args, variant)?;

    info!("Loading contact counts from {:?}", &app.counts_path);
    let contacts = artifacts::load_counts(&app.counts_path)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Solving {} structure for {} beads...", variant, contacts.size());
    let result = solve_and_write(&app, &contacts, &reporter)?;
    print_summary(&result);
    Ok(())
}

pub(crate) fn solve_and_write(
    app: &AppConfig,
    contacts: &ContactMatrix,
    reporter: &ProgressReporter,
) -> Result<StructureResult> {
    info!("Invoking the structure workflow...");
    let result = structure::run(&app.store, contacts, &app.solver, reporter)?;
    info!(
        iterations = result.solution.report.iterations,
        converged = result.solution.report.converged,
        "Structure workflow finished."
    );
    Ok(result)
}

fn print_summary(result: &StructureResult) {
    let report = &result.solution.report;
    let status = if report.converged {
        "converged"
    } else {
        "stopped at the iteration limit"
    };
    println!(
        "✓ {} structure {} after {} iterations (objective {:.6e}), written to: {}",
        report.variant,
        status,
        report.iterations,
        report.objective,
        result.path.display()
    );
    if report.variant == SolverVariant::Pm2 {
        println!("  Estimated beta: {:.6}", report.beta);
    }
}
