use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Common interface of the text artifact formats.
///
/// Implementors provide stream-level parsing and serialization; the path
/// helpers open, buffer and flush the underlying files.
pub trait TextArtifact {
    /// The in-memory value stored in the file.
    type Value;

    /// The error type for parsing and I/O.
    type Error: Error + From<io::Error>;

    /// Parses a value from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content is malformed.
    fn read_from(reader: &mut impl BufRead) -> Result<Self::Value, Self::Error>;

    /// Serializes a value to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(value: &Self::Value, writer: &mut impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Value, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(value: &Self::Value, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(value, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
