use super::text::{TextFormatError, read_rows};
use super::traits::TextArtifact;
use crate::core::models::organism::OrganismStructure;
use std::io::{BufRead, Write};

/// Segment lengths, whitespace separated. A file holding one bare scalar is a
/// single-segment organism.
pub struct OrganismFile;

impl TextArtifact for OrganismFile {
    type Value = OrganismStructure;
    type Error = TextFormatError;

    fn read_from(reader: &mut impl BufRead) -> Result<OrganismStructure, TextFormatError> {
        let values: Vec<f64> = read_rows(reader)?.into_iter().flatten().collect();
        Ok(OrganismStructure::from_values(&values)?)
    }

    fn write_to(value: &OrganismStructure, writer: &mut impl Write) -> Result<(), TextFormatError> {
        for len in value.lengths() {
            writeln!(writer, "{}", len)?;
        }
        Ok(())
    }
}
