//! Audit emission to stdout and an append-only log file.
//!
//! Every reached decision is emitted to both sinks with identical content.
//! The file sink is best-effort: if it cannot be opened or written, the
//! failure is logged and stdout emission proceeds. Nothing here ever
//! propagates an error to the request path. Diagnostic logging is expected
//! to go to stderr so stdout stays a clean record stream.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::ndjson::NdjsonWriter;
use crate::record::AuditRecord;

/// Emits one [`AuditRecord`] line per decision to stdout and a log file.
pub struct AuditEmitter {
    file: Option<Mutex<NdjsonWriter>>,
    path: PathBuf,
}

impl AuditEmitter {
    /// Open the emitter with an append-mode file sink at `path`.
    ///
    /// Missing parent directories are created. If the file cannot be opened
    /// the emitter degrades to stdout-only with a logged warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(dir = %parent.display(), error = %e, "failed to create audit log directory");
                }
            }
        }
        let file = match NdjsonWriter::open(&path) {
            Ok(writer) => Some(Mutex::new(writer)),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to open audit log file, emitting to stdout only");
                None
            }
        };
        Self { file, path }
    }

    /// An emitter with no file sink.
    pub fn stdout_only() -> Self {
        Self {
            file: None,
            path: PathBuf::new(),
        }
    }

    /// The configured log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Emit one record to both sinks. Never fails.
    pub fn emit(&self, record: &AuditRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to serialize audit record");
                return;
            }
        };

        // Serialize stdout writes so concurrent records never interleave.
        {
            let mut out = std::io::stdout().lock();
            if let Err(e) = writeln!(out, "{line}") {
                warn!(error = %e, "failed to write audit record to stdout");
            }
        }

        if let Some(file) = &self.file {
            let mut writer = file.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(e) = writer.append(record) {
                warn!(error = %e, "failed to write audit record to log file");
            }
        }
    }
}
