//! Append-only NDJSON log file.
//!
//! Each call to [`NdjsonWriter::append`] serializes a value to one JSON
//! line, writes a trailing newline, and flushes. Flushing on every write is
//! intentional: the log must be observable by external tails the moment the
//! record is emitted. [`NdjsonReader`] is a plain line reader used by tools
//! and tests to inspect the trail.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only NDJSON writer.
pub struct NdjsonWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl NdjsonWriter {
    /// Open or create the log file for appending.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Append a serializable value as a single JSON line and flush.
    pub fn append<T: serde::Serialize>(&mut self, value: &T) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, value).map_err(std::io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    /// The path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reads an NDJSON log back as lines.
pub struct NdjsonReader;

impl NdjsonReader {
    /// Read every line of the log at `path`, oldest first.
    pub fn read_lines(path: impl AsRef<Path>) -> std::io::Result<Vec<String>> {
        let file = File::open(path)?;
        BufReader::new(file).lines().collect()
    }

    /// Deserialize every line of the log at `path` into `T`.
    pub fn read_all<T: serde::de::DeserializeOwned>(
        path: impl AsRef<Path>,
    ) -> std::io::Result<Vec<T>> {
        Self::read_lines(path)?
            .iter()
            .map(|line| serde_json::from_str(line).map_err(std::io::Error::other))
            .collect()
    }
}
