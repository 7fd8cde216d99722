use super::text::{TextFormatError, format_scientific, read_rows};
use super::traits::TextArtifact;
use crate::core::models::coordinates::CoordinateSet;
use std::io::{BufRead, Write};

/// Bead coordinates, one `x y z` triple per line.
///
/// Reading flattens every value in the file, so the single-column layout some
/// native solvers emit is accepted as well; the value count must be a
/// multiple of three.
pub struct CoordinatesFile;

impl TextArtifact for CoordinatesFile {
    type Value = CoordinateSet;
    type Error = TextFormatError;

    fn read_from(reader: &mut impl BufRead) -> Result<CoordinateSet, TextFormatError> {
        let values: Vec<f64> = read_rows(reader)?.into_iter().flatten().collect();
        Ok(CoordinateSet::from_flat_inferred(&values)?)
    }

    fn write_to(value: &CoordinateSet, writer: &mut impl Write) -> Result<(), TextFormatError> {
        for p in value.points() {
            writeln!(
                writer,
                "{} {} {}",
                format_scientific(p.x),
                format_scientific(p.y),
                format_scientific(p.z)
            )?;
        }
        Ok(())
    }
}
