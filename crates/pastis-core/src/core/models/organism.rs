use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrganismError {
    #[error("Organism structure has no segment lengths")]
    Empty,
    #[error("Segment length {0} is not a positive integer")]
    InvalidLength(f64),
}

/// Segment lengths (chromosome sizes in base pairs) partitioning the beads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganismStructure {
    lengths: Vec<u64>,
}

impl OrganismStructure {
    pub fn new(lengths: Vec<u64>) -> Result<Self, OrganismError> {
        if lengths.is_empty() {
            return Err(OrganismError::Empty);
        }
        if let Some(&zero) = lengths.iter().find(|&&len| len == 0) {
            return Err(OrganismError::InvalidLength(zero as f64));
        }
        Ok(Self { lengths })
    }

    /// Accepts lengths parsed as reals; a single scalar yields a one-element structure.
    pub fn from_values(values: &[f64]) -> Result<Self, OrganismError> {
        let lengths = values
            .iter()
            .map(|&v| {
                if v.is_finite() && v > 0.0 && v.fract() == 0.0 {
                    Ok(v as u64)
                } else {
                    Err(OrganismError::InvalidLength(v))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(lengths)
    }

    pub fn lengths(&self) -> &[u64] {
        &self.lengths
    }

    pub fn segment_count(&self) -> usize {
        self.lengths.len()
    }

    /// Number of beads once every segment is binned at `resolution` base pairs.
    pub fn bead_count(&self, resolution: u64) -> usize {
        let resolution = resolution.max(1);
        self.lengths
            .iter()
            .map(|len| len.div_ceil(resolution) as usize)
            .sum()
    }
}
