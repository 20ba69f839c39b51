//! Human-readable diagnostics.
//!
//! Errors are returned to callers as [`LoaderError`] values, and each one is
//! also reported once to a [`DiagnosticSink`]. The default sink writes a single
//! line to standard error:
//!
//! ```text
//! wpe: could not load default backend library 'libWPEBackend-default.so': <reason>
//! wpe_load_object: failed to load object with name 'foo'
//! ```

use std::io::Write;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{ErrorKind, LoaderError};

/// Prefix for diagnostics about opening the backend.
pub const LOADER_ORIGIN: &str = "wpe";
/// Prefix for diagnostics about individual object requests.
pub const LOAD_OBJECT_ORIGIN: &str = "wpe_load_object";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub origin: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn from_error(err: &LoaderError) -> Self {
        let origin = match err.kind() {
            ErrorKind::SymbolNotFound => LOAD_OBJECT_ORIGIN,
            ErrorKind::OpenFailed | ErrorKind::NoBackendAvailable => LOADER_ORIGIN,
        };
        Self {
            origin,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}

/// Receives diagnostics. Implementations must tolerate concurrent callers.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Writes each diagnostic as one line on standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&self, diagnostic: &Diagnostic) {
        // A single write keeps lines from concurrent reporters intact.
        let line = format!("{diagnostic}\n");
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Keeps diagnostics in memory, in report order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of recorded diagnostics whose message contains `needle`.
    #[must_use]
    pub fn count_matching(&self, needle: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.message.contains(needle))
            .count()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.entries.lock().push(diagnostic.clone());
    }
}
