use pastis::engine::artifacts::ArtifactStore;
use pastis::engine::config::{RefinementConfig, SolverConfig};
use std::path::PathBuf;

pub struct AppConfig {
    pub store: ArtifactStore,
    pub counts_path: PathBuf,
    pub organism_path: PathBuf,
    pub solver: SolverConfig,
}

pub struct RefinementAppConfig {
    pub app: AppConfig,
    pub refinement: RefinementConfig,
    pub initial_solve: bool,
}
