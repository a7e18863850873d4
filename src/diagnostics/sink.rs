//! Destinations for diagnostic log lines.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::output::LINE_ENDING;
use crate::Result;

/// A destination that receives fully formatted log lines.
///
/// Lines arrive without a terminator; the sink appends its own.
pub trait LogSink: Send {
    /// Appends one line.
    ///
    /// # Errors
    /// Returns [`Error::Io`](crate::Error::Io) if the write fails.
    fn write_line(&mut self, line: &str) -> Result<()>;
}

/// Appends lines to a text file, creating it if needed.
///
/// The file is opened for every write so that other processes (or a user
/// deleting the log) never see a stale handle.
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Creates a sink appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the sink appends to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(LINE_ENDING.as_bytes())?;
        Ok(())
    }
}

/// Keeps lines in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("methods.log");

        let mut sink = FileSink::new(&path);
        sink.write_line("first").unwrap();
        sink.write_line("\tsecond").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("first{LINE_ENDING}\tsecond{LINE_ENDING}"));
    }

    #[test]
    fn file_sink_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("missing").join("methods.log"));
        assert!(matches!(sink.write_line("x"), Err(crate::Error::Io(_))));
    }

    #[test]
    fn memory_sink_clones_share_lines() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write_line("a").unwrap();
        writer.write_line("b").unwrap();
        assert_eq!(sink.lines(), vec!["a", "b"]);
    }
}
