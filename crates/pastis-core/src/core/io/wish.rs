use super::text::{TextFormatError, TextParseErrorKind, data_lines, parse_number};
use crate::core::models::organism::OrganismStructure;
use crate::core::models::wish::WishDistances;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// Sparse wish-distance file read by the native solvers.
///
/// Each line is `i<TAB>j<TAB>distance` for a nonzero upper-triangle entry,
/// with 1-based bead indices.
pub struct WishDistancesFile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WishEntry {
    pub row: usize,
    pub col: usize,
    pub distance: f64,
}

impl WishDistancesFile {
    /// Writes the nonzero upper triangle. The organism structure is checked
    /// against the matrix size; a mismatch is logged, not rejected.
    pub fn write_to(
        wish: &WishDistances,
        organism: &OrganismStructure,
        resolution: u64,
        writer: &mut impl Write,
    ) -> Result<(), TextFormatError> {
        let expected = organism.bead_count(resolution);
        if expected != wish.size() {
            warn!(
                expected,
                found = wish.size(),
                resolution,
                "Organism structure does not match the number of beads."
            );
        }
        for (i, j, distance) in wish.upper_triangle_entries() {
            writeln!(writer, "{}\t{}\t{:.6}", i + 1, j + 1, distance)?;
        }
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(
        wish: &WishDistances,
        organism: &OrganismStructure,
        resolution: u64,
        path: P,
    ) -> Result<(), TextFormatError> {
        let mut writer = BufWriter::new(File::create(path)?);
        Self::write_to(wish, organism, resolution, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads the entries back, converting indices to 0-based.
    pub fn read_entries(reader: &mut impl BufRead) -> Result<Vec<WishEntry>, TextFormatError> {
        let mut entries = Vec::new();
        for line in data_lines(reader) {
            let line = line?;
            let fields: Vec<&str> = line.content.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(TextFormatError::Parse {
                    line: line.number,
                    kind: TextParseErrorKind::WrongFieldCount {
                        expected: 3,
                        found: fields.len(),
                    },
                });
            }
            let index = |token: &str| -> Result<usize, TextFormatError> {
                match token.parse::<usize>() {
                    Ok(value) if value >= 1 => Ok(value - 1),
                    _ => Err(TextFormatError::Parse {
                        line: line.number,
                        kind: TextParseErrorKind::InvalidIndex {
                            value: token.to_string(),
                        },
                    }),
                }
            };
            entries.push(WishEntry {
                row: index(fields[0])?,
                col: index(fields[1])?,
                distance: parse_number(fields[2], line.number)?,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use std::io::Cursor;

    fn sample_wish() -> WishDistances {
        WishDistances::from_matrix(DMatrix::from_row_slice(
            3,
            3,
            &[0.0, 812.5, 0.0, 812.5, 0.0, 1000.25, 0.0, 1000.25, 0.0],
        ))
    }

    #[test]
    fn only_nonzero_upper_triangle_is_written() {
        let organism = OrganismStructure::new(vec![30]).unwrap();
        let mut buffer = Vec::new();
        WishDistancesFile::write_to(&sample_wish(), &organism, 10, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "1\t2\t812.500000\n2\t3\t1000.250000\n"
        );
    }

    #[test]
    fn written_entries_read_back_zero_based() {
        let organism = OrganismStructure::new(vec![3]).unwrap();
        let mut buffer = Vec::new();
        WishDistancesFile::write_to(&sample_wish(), &organism, 1, &mut buffer).unwrap();

        let entries = WishDistancesFile::read_entries(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(
            entries,
            vec![
                WishEntry {
                    row: 0,
                    col: 1,
                    distance: 812.5
                },
                WishEntry {
                    row: 1,
                    col: 2,
                    distance: 1000.25
                },
            ]
        );
    }

    #[test]
    fn zero_index_is_rejected() {
        let result = WishDistancesFile::read_entries(&mut Cursor::new("0\t1\t2.0\n"));
        assert!(matches!(
            result,
            Err(TextFormatError::Parse {
                line: 1,
                kind: TextParseErrorKind::InvalidIndex { .. }
            })
        ));
    }
}
