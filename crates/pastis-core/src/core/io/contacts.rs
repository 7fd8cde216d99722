use super::text::{TextFormatError, TextParseErrorKind, data_lines, parse_number};
use super::traits::TextArtifact;
use crate::core::models::contacts::ContactMatrix;
use nalgebra::DMatrix;
use ndarray::Array2;
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyExt};
use std::io::{BufRead, Read, Write};

/// A dense contact-count matrix, one whitespace-separated row per line.
///
/// `nan` tokens are accepted and become zero counts.
pub struct CountsFile;

impl TextArtifact for CountsFile {
    type Value = ContactMatrix;
    type Error = TextFormatError;

    fn read_from(reader: &mut impl BufRead) -> Result<ContactMatrix, TextFormatError> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for line in data_lines(reader) {
            let line = line?;
            let row = line
                .content
                .split_whitespace()
                .map(|token| parse_number(token, line.number))
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(first) = rows.first() {
                if row.len() != first.len() {
                    return Err(TextFormatError::Parse {
                        line: line.number,
                        kind: TextParseErrorKind::WrongFieldCount {
                            expected: first.len(),
                            found: row.len(),
                        },
                    });
                }
            }
            rows.push(row);
        }
        Ok(ContactMatrix::from_rows(&rows)?)
    }

    fn write_to(value: &ContactMatrix, writer: &mut impl Write) -> Result<(), TextFormatError> {
        let matrix = value.as_matrix();
        for row in matrix.row_iter() {
            let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// A contact-count matrix saved with `numpy.save`.
///
/// The array must be two-dimensional. `float64`, `int64` and `int32` dtypes are
/// read; NaN counts become zero as for the text format.
pub struct NpyCountsFile;

impl TextArtifact for NpyCountsFile {
    type Value = ContactMatrix;
    type Error = TextFormatError;

    fn read_from(reader: &mut impl BufRead) -> Result<ContactMatrix, TextFormatError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let array = read_count_array(&bytes)?;
        let (rows, cols) = array.dim();
        Ok(ContactMatrix::new(DMatrix::from_fn(rows, cols, |i, j| {
            array[[i, j]]
        }))?)
    }

    fn write_to(value: &ContactMatrix, writer: &mut impl Write) -> Result<(), TextFormatError> {
        let matrix = value.as_matrix();
        let array = Array2::from_shape_fn(matrix.shape(), |(i, j)| matrix[(i, j)]);
        array.write_npy(writer)?;
        Ok(())
    }
}

fn read_count_array(bytes: &[u8]) -> Result<Array2<f64>, ReadNpyError> {
    match Array2::<f64>::read_npy(bytes) {
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        other => return other,
    }
    match Array2::<i64>::read_npy(bytes) {
        Ok(array) => return Ok(array.mapv(|count| count as f64)),
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        Err(e) => return Err(e),
    }
    Array2::<i32>::read_npy(bytes).map(|array| array.mapv(f64::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::contacts::MatrixError;
    use ndarray::{Array1, array};
    use std::io::Cursor;

    #[test]
    fn dense_matrix_with_nan_is_cleaned() {
        let mut reader = Cursor::new("0 5 nan\n5 0 3\nnan 3 0\n");
        let matrix = CountsFile::read_from(&mut reader).unwrap();
        assert_eq!(matrix.size(), 3);
        assert_eq!(matrix.get(0, 2), 0.0);
        assert_eq!(matrix.get(2, 0), 0.0);
        assert_eq!(matrix.get(1, 2), 3.0);
    }

    #[test]
    fn ragged_rows_report_the_offending_line() {
        let mut reader = Cursor::new("0 1\n1 0 2\n");
        let result = CountsFile::read_from(&mut reader);
        assert!(matches!(
            result,
            Err(TextFormatError::Parse {
                line: 2,
                kind: TextParseErrorKind::WrongFieldCount {
                    expected: 2,
                    found: 3
                }
            })
        ));
    }

    #[test]
    fn rectangular_matrix_is_invalid_input() {
        let mut reader = Cursor::new("0 1 2\n1 0 2\n");
        let result = CountsFile::read_from(&mut reader);
        assert!(matches!(
            result,
            Err(TextFormatError::Matrix(MatrixError::NotSquare { .. }))
        ));
    }

    #[test]
    fn empty_file_is_invalid_input() {
        let mut reader = Cursor::new("\n# nothing\n");
        let result = CountsFile::read_from(&mut reader);
        assert!(matches!(
            result,
            Err(TextFormatError::Matrix(MatrixError::Empty))
        ));
    }

    #[test]
    fn written_matrix_reads_back_identically() {
        let matrix =
            ContactMatrix::from_rows(&[vec![0.0, 2.5], vec![2.5, 0.0]]).unwrap();
        let mut buffer = Vec::new();
        CountsFile::write_to(&matrix, &mut buffer).unwrap();
        let restored = CountsFile::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(restored, matrix);
    }

    fn npy_bytes<A: WriteNpyExt>(array: &A) -> Vec<u8> {
        let mut bytes = Vec::new();
        array.write_npy(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn npy_float_matrix_with_nan_is_cleaned() {
        let bytes = npy_bytes(&array![[0.0, 5.0, f64::NAN], [5.0, 0.0, 3.0], [f64::NAN, 3.0, 0.0]]);
        let matrix = NpyCountsFile::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(matrix.size(), 3);
        assert_eq!(matrix.get(0, 2), 0.0);
        assert_eq!(matrix.get(2, 0), 0.0);
        assert_eq!(matrix.get(0, 1), 5.0);
    }

    #[test]
    fn npy_integer_counts_are_accepted() {
        let bytes = npy_bytes(&array![[0i64, 7], [7, 0]]);
        let matrix = NpyCountsFile::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(matrix.get(1, 0), 7.0);

        let bytes = npy_bytes(&array![[0i32, 2], [2, 0]]);
        let matrix = NpyCountsFile::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(matrix.get(0, 1), 2.0);
    }

    #[test]
    fn npy_vector_is_rejected() {
        let bytes = npy_bytes(&Array1::from(vec![1.0, 2.0, 3.0]));
        let result = NpyCountsFile::read_from(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(TextFormatError::NpyRead(_))));
    }

    #[test]
    fn npy_rectangular_matrix_is_invalid_input() {
        let bytes = npy_bytes(&array![[0.0, 1.0, 2.0], [1.0, 0.0, 2.0]]);
        let result = NpyCountsFile::read_from(&mut Cursor::new(bytes));
        assert!(matches!(
            result,
            Err(TextFormatError::Matrix(MatrixError::NotSquare { rows: 2, cols: 3 }))
        ));
    }

    #[test]
    fn npy_written_matrix_reads_back_identically() {
        let matrix =
            ContactMatrix::from_rows(&[vec![0.0, 4.0], vec![4.0, 0.0]]).unwrap();
        let mut buffer = Vec::new();
        NpyCountsFile::write_to(&matrix, &mut buffer).unwrap();
        let restored = NpyCountsFile::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(restored, matrix);
    }
}
