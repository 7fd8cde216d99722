use crate::core::models::contacts::MatrixError;
use crate::core::models::coordinates::ShapeError;
use crate::core::models::organism::OrganismError;
use ndarray_npy::{ReadNpyError, WriteNpyError};
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextFormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: TextParseErrorKind,
    },
    #[error("Invalid contact matrix: {0}")]
    Matrix(#[from] MatrixError),
    #[error("Invalid coordinates: {0}")]
    Shape(#[from] ShapeError),
    #[error("Invalid organism structure: {0}")]
    Organism(#[from] OrganismError),
    #[error("Invalid .npy array: {0}")]
    NpyRead(#[from] ReadNpyError),
    #[error("Failed to write .npy array: {0}")]
    NpyWrite(#[from] WriteNpyError),
}

#[derive(Debug, Error)]
pub enum TextParseErrorKind {
    #[error("Invalid number '{value}'")]
    InvalidNumber { value: String },
    #[error("Expected {expected} values, found {found}")]
    WrongFieldCount { expected: usize, found: usize },
    #[error("Invalid bead index '{value}'")]
    InvalidIndex { value: String },
}

/// One non-empty data line, with its 1-based line number.
pub(crate) struct DataLine {
    pub number: usize,
    pub content: String,
}

/// Yields data lines, skipping blanks and `#` comments.
pub(crate) fn data_lines(
    reader: &mut impl BufRead,
) -> impl Iterator<Item = Result<DataLine, io::Error>> + '_ {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match line {
            Ok(line) => {
                let content = match line.split_once('#') {
                    Some((data, _)) => data.trim(),
                    None => line.trim(),
                };
                (!content.is_empty()).then(|| {
                    Ok(DataLine {
                        number: idx + 1,
                        content: content.to_string(),
                    })
                })
            }
            Err(e) => Some(Err(e)),
        })
}

pub(crate) fn parse_number(token: &str, line: usize) -> Result<f64, TextFormatError> {
    token.parse::<f64>().map_err(|_| TextFormatError::Parse {
        line,
        kind: TextParseErrorKind::InvalidNumber {
            value: token.to_string(),
        },
    })
}

/// Parses every line into a row of reals.
pub(crate) fn read_rows(reader: &mut impl BufRead) -> Result<Vec<Vec<f64>>, TextFormatError> {
    let mut rows = Vec::new();
    for line in data_lines(reader) {
        let line = line?;
        let row = line
            .content
            .split_whitespace()
            .map(|token| parse_number(token, line.number))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Formats a real the way `numpy.savetxt` does by default (`%.18e`).
pub fn format_scientific(value: f64) -> String {
    let formatted = format!("{:.18e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}
