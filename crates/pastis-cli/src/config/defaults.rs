pub const CONFIG_FILE_NAME: &str = "config.toml";

pub struct DefaultsConfig {
    pub seed: u64,
    pub counts: String,
    pub alpha: f64,
    pub beta: f64,
    pub max_iter: usize,
    pub verbose: u8,
    pub output_name: String,
    pub organism_structure: String,
    pub resolution: u64,
    pub binary_mds: String,
    pub adjacent_beads: String,
    pub chromosomes: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            counts: "counts.txt".to_string(),
            alpha: -3.0,
            beta: 1.0,
            max_iter: 10_000,
            verbose: 1,
            output_name: "structure".to_string(),
            organism_structure: "organism_structure.txt".to_string(),
            resolution: 10_000,
            binary_mds: "MDS_all".to_string(),
            adjacent_beads: "1.5".to_string(),
            chromosomes: "1".to_string(),
        }
    }
}
