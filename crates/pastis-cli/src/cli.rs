use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "PASTIS - infer 3D chromosome structures from Hi-C contact counts.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit a structure by metric MDS and write MDS.<name>.txt.
    Mds(RunArgs),
    /// Fit a structure by Poisson likelihood with fixed alpha and beta.
    Pm1(RunArgs),
    /// Fit a structure by Poisson likelihood, estimating beta.
    Pm2(RunArgs),
    /// Fit the MDS structure, then refine it with NMDS rounds through the native solver.
    Nmds(NmdsArgs),
}

/// Arguments shared by every solving subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Run directory holding the inputs; all artifacts are written here.
    #[arg(required = true, value_name = "DIR")]
    pub directory: PathBuf,

    /// Configuration file in TOML format. Defaults to DIR/config.toml when present.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the random seed of the initial structure.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the maximum number of descent iterations.
    #[arg(long, value_name = "INT")]
    pub max_iter: Option<usize>,

    /// Override the count-to-distance exponent.
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true)]
    pub alpha: Option<f64>,

    /// Override the count-to-distance scale.
    #[arg(long, value_name = "FLOAT")]
    pub beta: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S output_name=chr1
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `nmds` subcommand.
#[derive(Args, Debug, Clone)]
pub struct NmdsArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Override the number of refinement rounds.
    #[arg(long, value_name = "INT")]
    pub rounds: Option<usize>,

    /// Reuse an existing MDS.<name>.txt instead of solving it first.
    #[arg(long)]
    pub no_initial_solve: bool,
}
