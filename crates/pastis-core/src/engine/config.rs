use super::bridge::CommandHyperparameters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Relative objective change (and gradient norm) below which a solve stops.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Number of NMDS rounds when none is configured.
pub const DEFAULT_REFINEMENT_ROUNDS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Objective used to fit a structure to contact counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverVariant {
    /// Weighted metric stress against distances implied by the counts.
    Mds,
    /// Poisson likelihood with fixed `alpha` and `beta`.
    Pm1,
    /// Poisson likelihood with `beta` estimated alongside the structure.
    Pm2,
}

impl SolverVariant {
    /// Prefix of the structure artifact written by this variant.
    pub fn label(&self) -> &'static str {
        match self {
            SolverVariant::Mds => "MDS",
            SolverVariant::Pm1 => "PM1",
            SolverVariant::Pm2 => "PM2",
        }
    }
}

impl fmt::Display for SolverVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub variant: SolverVariant,
    pub alpha: f64,
    pub beta: f64,
    pub max_iterations: usize,
    pub seed: u64,
    pub tolerance: f64,
    pub verbose: u8,
}

#[derive(Default)]
pub struct SolverConfigBuilder {
    variant: Option<SolverVariant>,
    alpha: Option<f64>,
    beta: Option<f64>,
    max_iterations: Option<usize>,
    seed: Option<u64>,
    tolerance: Option<f64>,
    verbose: Option<u8>,
}

impl SolverConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant(mut self, variant: SolverVariant) -> Self {
        self.variant = Some(variant);
        self
    }
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = Some(level);
        self
    }

    pub fn build(self) -> Result<SolverConfig, ConfigError> {
        let alpha = self.alpha.ok_or(ConfigError::MissingParameter("alpha"))?;
        if !alpha.is_finite() || alpha == 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "alpha",
                reason: format!("must be finite and nonzero, got {}", alpha),
            });
        }
        let beta = self.beta.ok_or(ConfigError::MissingParameter("beta"))?;
        if !beta.is_finite() || beta <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "beta",
                reason: format!("must be finite and positive, got {}", beta),
            });
        }
        let tolerance = self.tolerance.unwrap_or(DEFAULT_TOLERANCE);
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "tolerance",
                reason: format!("must be finite and non-negative, got {}", tolerance),
            });
        }
        Ok(SolverConfig {
            variant: self
                .variant
                .ok_or(ConfigError::MissingParameter("variant"))?,
            alpha,
            beta,
            max_iterations: self
                .max_iterations
                .ok_or(ConfigError::MissingParameter("max_iterations"))?,
            seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
            tolerance,
            verbose: self.verbose.unwrap_or(0),
        })
    }
}

/// Command-line grammar expected by the native solver binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStyle {
    #[default]
    Mds,
    Pm,
}

/// What a non-zero exit of the native solver means for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatusPolicy {
    /// Abort the refinement with `SolverProcess`.
    #[default]
    Fail,
    /// Log a warning and continue with whatever the solver left on disk.
    Warn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementConfig {
    pub rounds: usize,
    pub binary: PathBuf,
    pub resolution: u64,
    pub hyperparameters: CommandHyperparameters,
    pub exit_status_policy: ExitStatusPolicy,
    pub timeout: Option<Duration>,
}

#[derive(Default)]
pub struct RefinementConfigBuilder {
    rounds: Option<usize>,
    binary: Option<PathBuf>,
    resolution: Option<u64>,
    command_style: Option<CommandStyle>,
    adjacent_beads: Option<String>,
    chromosomes: Option<String>,
    alpha: Option<f64>,
    beta: Option<f64>,
    exit_status_policy: Option<ExitStatusPolicy>,
    timeout: Option<Duration>,
}

impl RefinementConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }
    pub fn binary(mut self, path: PathBuf) -> Self {
        self.binary = Some(path);
        self
    }
    pub fn resolution(mut self, resolution: u64) -> Self {
        self.resolution = Some(resolution);
        self
    }
    pub fn command_style(mut self, style: CommandStyle) -> Self {
        self.command_style = Some(style);
        self
    }
    pub fn adjacent_beads(mut self, value: impl Into<String>) -> Self {
        self.adjacent_beads = Some(value.into());
        self
    }
    pub fn chromosomes(mut self, value: impl Into<String>) -> Self {
        self.chromosomes = Some(value.into());
        self
    }
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }
    pub fn exit_status_policy(mut self, policy: ExitStatusPolicy) -> Self {
        self.exit_status_policy = Some(policy);
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<RefinementConfig, ConfigError> {
        let resolution = self
            .resolution
            .ok_or(ConfigError::MissingParameter("resolution"))?;
        if resolution == 0 {
            return Err(ConfigError::InvalidValue {
                key: "resolution",
                reason: "must be positive".to_string(),
            });
        }
        let adjacent_beads = self
            .adjacent_beads
            .ok_or(ConfigError::MissingParameter("adjacent_beads"))?;
        let chromosomes = self
            .chromosomes
            .ok_or(ConfigError::MissingParameter("chromosomes"))?;

        let hyperparameters = match self.command_style.unwrap_or_default() {
            CommandStyle::Mds => CommandHyperparameters::Mds {
                adjacent_beads,
                chromosomes,
            },
            CommandStyle::Pm => CommandHyperparameters::Pm {
                adjacent_beads: adjacent_beads.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue {
                        key: "adjacent_beads",
                        reason: format!("'{}' is not a number", adjacent_beads),
                    }
                })?,
                chromosomes,
                alpha: self.alpha.ok_or(ConfigError::MissingParameter("alpha"))?,
                beta: self.beta.ok_or(ConfigError::MissingParameter("beta"))?,
            },
        };

        Ok(RefinementConfig {
            rounds: self.rounds.unwrap_or(DEFAULT_REFINEMENT_ROUNDS),
            binary: self.binary.ok_or(ConfigError::MissingParameter("binary"))?,
            resolution,
            hyperparameters,
            exit_status_policy: self.exit_status_policy.unwrap_or_default(),
            timeout: self.timeout,
        })
    }
}
