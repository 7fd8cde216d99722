use super::defaults::{CONFIG_FILE_NAME, DefaultsConfig};
use super::file::{FileConfig, ScalarValue};
use super::models::{AppConfig, RefinementAppConfig};
use crate::cli::{NmdsArgs, RunArgs};
use crate::error::{CliError, Result};
use pastis::engine::artifacts::ArtifactStore;
use pastis::engine::config::{
    self as core_config, CommandStyle, ExitStatusPolicy, SolverVariant,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

fn load_file_config(args: &RunArgs) -> Result<FileConfig> {
    let discovered = args.directory.join(CONFIG_FILE_NAME);
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None if discovered.is_file() => FileConfig::from_file(&discovered)?,
        None => {
            debug!("No configuration file found; using defaults.");
            FileConfig::default()
        }
    };
    apply_set_values(file_config, &args.set_values)
}

pub fn build_config(args: &RunArgs, variant: SolverVariant) -> Result<AppConfig> {
    let file_config = load_file_config(args)?;
    assemble(args, variant, &file_config)
}

pub fn build_refinement_config(args: &NmdsArgs) -> Result<RefinementAppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = load_file_config(&args.run)?;
    let app = assemble(&args.run, SolverVariant::Mds, &file_config)?;

    let mut builder = core_config::RefinementConfigBuilder::new()
        .rounds(
            args.rounds
                .or(file_config.rounds)
                .unwrap_or(core_config::DEFAULT_REFINEMENT_ROUNDS),
        )
        .binary(
            file_config
                .binary_mds
                .clone()
                .unwrap_or_else(|| PathBuf::from(&defaults.binary_mds)),
        )
        .resolution(file_config.resolution.unwrap_or(defaults.resolution))
        .command_style(file_config.command_style.unwrap_or_default())
        .adjacent_beads(
            file_config
                .adjacent_beads
                .as_ref()
                .map(ScalarValue::render)
                .unwrap_or(defaults.adjacent_beads),
        )
        .chromosomes(
            file_config
                .chromosomes
                .as_ref()
                .map(ScalarValue::render)
                .unwrap_or(defaults.chromosomes),
        )
        .alpha(app.solver.alpha)
        .beta(app.solver.beta)
        .exit_status_policy(file_config.exit_status_policy.unwrap_or_default());
    if let Some(secs) = file_config.solver_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let refinement = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(RefinementAppConfig {
        app,
        refinement,
        initial_solve: !args.no_initial_solve,
    })
}

fn assemble(args: &RunArgs, variant: SolverVariant, file: &FileConfig) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let store = ArtifactStore::new(
        &args.directory,
        file.output_name
            .clone()
            .unwrap_or_else(|| defaults.output_name.clone()),
    );
    let counts_path = store.resolve(
        file.counts
            .clone()
            .unwrap_or_else(|| PathBuf::from(&defaults.counts)),
    );
    let organism_path = store.resolve(
        file.organism_structure
            .clone()
            .unwrap_or_else(|| PathBuf::from(&defaults.organism_structure)),
    );

    let mut builder = core_config::SolverConfigBuilder::new()
        .variant(variant)
        .alpha(args.alpha.or(file.alpha).unwrap_or(defaults.alpha))
        .beta(args.beta.or(file.beta).unwrap_or(defaults.beta))
        .max_iterations(args.max_iter.or(file.max_iter).unwrap_or(defaults.max_iter))
        .seed(args.seed.or(file.seed).unwrap_or(defaults.seed))
        .verbose(file.verbose.unwrap_or(defaults.verbose));
    if let Some(tolerance) = file.tolerance {
        builder = builder.tolerance(tolerance);
    }
    let solver = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        store,
        counts_path,
        organism_path,
        solver,
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key.trim() {
            "seed" => config.seed = Some(parse_value(key, value)?),
            "counts" => config.counts = Some(PathBuf::from(value)),
            "alpha" => config.alpha = Some(parse_value(key, value)?),
            "beta" => config.beta = Some(parse_value(key, value)?),
            "max_iter" => config.max_iter = Some(parse_value(key, value)?),
            "verbose" => config.verbose = Some(parse_value(key, value)?),
            "tolerance" => config.tolerance = Some(parse_value(key, value)?),
            "output_name" => config.output_name = Some(value.to_string()),
            "organism_structure" => config.organism_structure = Some(PathBuf::from(value)),
            "resolution" => config.resolution = Some(parse_value(key, value)?),
            "binary_mds" => config.binary_mds = Some(PathBuf::from(value)),
            "adjacent_beads" => config.adjacent_beads = Some(ScalarValue::parse(value)),
            "chromosomes" => config.chromosomes = Some(ScalarValue::parse(value)),
            "rounds" => config.rounds = Some(parse_value(key, value)?),
            "solver_timeout_secs" => config.solver_timeout_secs = Some(parse_value(key, value)?),
            "command_style" => {
                config.command_style = Some(match value.trim() {
                    "mds" => CommandStyle::Mds,
                    "pm" => CommandStyle::Pm,
                    other => {
                        return Err(CliError::Config(format!(
                            "Invalid value for command_style: {} (expected 'mds' or 'pm')",
                            other
                        )));
                    }
                });
            }
            "exit_status_policy" => {
                config.exit_status_policy = Some(match value.trim() {
                    "fail" => ExitStatusPolicy::Fail,
                    "warn" => ExitStatusPolicy::Warn,
                    other => {
                        return Err(CliError::Config(format!(
                            "Invalid value for exit_status_policy: {} (expected 'fail' or 'warn')",
                            other
                        )));
                    }
                });
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
