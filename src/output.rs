//! Result output file and elapsed-time formatting.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use num_bigint::BigUint;

use crate::Result;

/// Platform line terminator used for every file this crate writes.
pub const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// How each found value is appended to the output file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "console", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "console", serde(rename_all = "lowercase"))]
pub enum OutputMode {
    /// A size header, a blank line, the decimal value and a trailing blank line.
    Verbose,
    /// The decimal value on its own line.
    Compact,
}

/// Size of a found value, as shown in headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueSize {
    /// Bit length.
    pub bits: u64,
    /// Number of decimal digits.
    pub digits: usize,
}

impl ValueSize {
    /// Measures `value`.
    #[must_use]
    pub fn of(value: &BigUint) -> Self {
        Self {
            bits: value.bits(),
            digits: value.to_str_radix(10).len(),
        }
    }
}

/// Appends found values to a file. Existing content is never overwritten.
#[derive(Clone, Debug)]
pub struct ResultWriter {
    path: PathBuf,
    mode: OutputMode,
}

impl ResultWriter {
    /// Creates a writer appending to `path` in the given mode.
    pub fn new(path: impl Into<PathBuf>, mode: OutputMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    /// Output file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Output mode.
    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Appends `value` in the configured format.
    ///
    /// # Errors
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be opened or
    /// written.
    pub fn append(&self, value: &BigUint) -> Result<()> {
        let entry = self.render(value);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        Ok(())
    }

    fn render(&self, value: &BigUint) -> String {
        let decimal = value.to_str_radix(10);
        match self.mode {
            OutputMode::Verbose => {
                let size = ValueSize::of(value);
                format!(
                    "{} bit prime ({} digits):{LINE_ENDING}{decimal}{LINE_ENDING}{LINE_ENDING}",
                    size.bits, size.digits
                )
            }
            OutputMode::Compact => format!("{decimal}{LINE_ENDING}"),
        }
    }
}

/// Formats a duration as `HH:MM:SS.mmm`. Hours are not wrapped at 24.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        elapsed.subsec_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_block_layout() {
        let writer = ResultWriter::new("unused", OutputMode::Verbose);
        let rendered = writer.render(&BigUint::from(65_521u32));
        assert_eq!(
            rendered,
            format!("16 bit prime (5 digits):{LINE_ENDING}65521{LINE_ENDING}{LINE_ENDING}")
        );
    }

    #[test]
    fn compact_line_layout() {
        let writer = ResultWriter::new("unused", OutputMode::Compact);
        assert_eq!(
            writer.render(&BigUint::from(7u32)),
            format!("7{LINE_ENDING}")
        );
    }

    #[test]
    fn append_never_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("primes.txt");
        std::fs::write(&path, "existing").unwrap();

        let writer = ResultWriter::new(&path, OutputMode::Compact);
        writer.append(&BigUint::from(11u32)).unwrap();
        writer.append(&BigUint::from(13u32)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("existing11{LINE_ENDING}13{LINE_ENDING}"));
    }

    #[test]
    fn value_size_counts_bits_and_digits() {
        let size = ValueSize::of(&BigUint::from(1_000_003u32));
        assert_eq!(
            size,
            ValueSize {
                bits: 20,
                digits: 7,
            }
        );
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00.000");
        assert_eq!(
            format_elapsed(Duration::from_millis(61_005)),
            "00:01:01.005"
        );
        assert_eq!(
            format_elapsed(Duration::from_secs(100 * 3600 + 59)),
            "100:00:59.000"
        );
    }
}
