use crate::error::{CliError, Result};
use pastis::engine::config::{CommandStyle, ExitStatusPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A value forwarded verbatim to the native solver's command line.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ScalarValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    pub fn parse(text: &str) -> Self {
        if let Ok(value) = text.parse() {
            ScalarValue::Integer(value)
        } else if let Ok(value) = text.parse() {
            ScalarValue::Float(value)
        } else {
            ScalarValue::Text(text.to_string())
        }
    }

    pub fn render(&self) -> String {
        match self {
            ScalarValue::Integer(v) => v.to_string(),
            ScalarValue::Float(v) => format!("{:?}", v),
            ScalarValue::Text(v) => v.clone(),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub seed: Option<u64>,
    pub counts: Option<PathBuf>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub max_iter: Option<usize>,
    pub verbose: Option<u8>,
    pub tolerance: Option<f64>,
    pub output_name: Option<String>,
    pub organism_structure: Option<PathBuf>,
    pub resolution: Option<u64>,
    pub binary_mds: Option<PathBuf>,
    pub adjacent_beads: Option<ScalarValue>,
    pub chromosomes: Option<ScalarValue>,
    pub rounds: Option<usize>,
    pub command_style: Option<CommandStyle>,
    pub exit_status_policy: Option<ExitStatusPolicy>,
    pub solver_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn full_file_is_parsed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            seed = 3
            counts = "chr1.counts"
            alpha = -2.5
            beta = 2.0
            max_iter = 500
            verbose = 0
            output_name = "chr1"
            organism_structure = "lengths.txt"
            resolution = 5000
            binary_mds = "/opt/pastis/PM_all"
            adjacent_beads = 1.5
            chromosomes = "1,2"
            rounds = 3
            command_style = "pm"
            exit_status_policy = "warn"
            solver_timeout_secs = 600
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.alpha, Some(-2.5));
        assert_eq!(config.adjacent_beads, Some(ScalarValue::Float(1.5)));
        assert_eq!(config.chromosomes, Some(ScalarValue::Text("1,2".to_string())));
        assert_eq!(config.command_style, Some(CommandStyle::Pm));
        assert_eq!(config.exit_status_policy, Some(ExitStatusPolicy::Warn));
        assert_eq!(config.solver_timeout_secs, Some(600));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_iterations = 10\n").unwrap();

        let result = FileConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn scalars_render_like_the_written_value() {
        assert_eq!(ScalarValue::Integer(1).render(), "1");
        assert_eq!(ScalarValue::Float(1.5).render(), "1.5");
        assert_eq!(ScalarValue::Float(2.0).render(), "2.0");
        assert_eq!(ScalarValue::parse("1,2,3").render(), "1,2,3");
        assert_eq!(ScalarValue::parse("7"), ScalarValue::Integer(7));
    }
}
