//! Run a loader against a list of object names and summarize what it found.

use std::ffi::CString;
use std::io::Write;

use serde::Serialize;
use thiserror::Error;
use wpe_loader_core::{BackendSelection, BackendSource, LibraryOpener, Loader, LoaderError};

use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("object name {0:?} contains an interior NUL byte")]
    InvalidName(String),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// True when no backend library could be opened.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Loader(err) if err.is_fatal())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectProbe {
    pub name: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Outcome of one probe run.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub source: BackendSource,
    pub library: String,
    pub interface: bool,
    pub objects: Vec<ObjectProbe>,
}

impl ProbeReport {
    #[must_use]
    pub fn found_count(&self) -> usize {
        self.objects.iter().filter(|o| o.found).count()
    }
}

pub(crate) fn source_label(source: BackendSource) -> &'static str {
    match source {
        BackendSource::CompileTime => "compile_time",
        BackendSource::Environment => "environment",
        BackendSource::Default => "default",
    }
}

fn backend_entry(level: LogLevel, event: &str, selection: &BackendSelection) -> LogEntry {
    LogEntry::new("", level, event)
        .with_backend(source_label(selection.source), selection.library_display())
}

/// Load every name in `names` through `loader`.
///
/// Names are validated before the backend is touched. Per-object misses are
/// recorded in the report; a fatal loader outcome ends the probe with
/// [`ProbeError::Loader`].
pub fn probe_objects<O, W>(
    loader: &Loader<O>,
    names: &[String],
    mut log: Option<&mut LogEmitter<W>>,
) -> Result<ProbeReport, ProbeError>
where
    O: LibraryOpener,
    W: Write,
{
    let c_names = names
        .iter()
        .map(|name| CString::new(name.as_str()).map_err(|_| ProbeError::InvalidName(name.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let selection = loader.selection();
    let backend = match loader.backend() {
        Ok(backend) => backend,
        Err(err) => {
            if let Some(log) = log.as_deref_mut() {
                log.emit_entry(
                    backend_entry(LogLevel::Fatal, "backend_unavailable", &selection)
                        .with_outcome(Outcome::Fatal)
                        .with_details(serde_json::json!({ "error": err.to_string() })),
                )?;
                log.flush()?;
            }
            return Err(err.into());
        }
    };
    let interface = backend.has_interface();
    if let Some(log) = log.as_deref_mut() {
        log.emit_entry(
            backend_entry(LogLevel::Info, "backend_ready", &selection).with_interface(interface),
        )?;
    }

    let mut objects = Vec::with_capacity(names.len());
    for (name, c_name) in names.iter().zip(&c_names) {
        let probe = match loader.load_object(c_name) {
            Ok(addr) => {
                if let Some(log) = log.as_deref_mut() {
                    log.emit_entry(
                        LogEntry::new("", LogLevel::Info, "object_loaded")
                            .with_symbol(name.as_str())
                            .with_outcome(Outcome::Found)
                            .with_address(addr.to_string()),
                    )?;
                }
                ObjectProbe {
                    name: name.clone(),
                    found: true,
                    address: Some(addr.to_string()),
                }
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                if let Some(log) = log.as_deref_mut() {
                    log.emit_entry(
                        LogEntry::new("", LogLevel::Warn, "object_missing")
                            .with_symbol(name.as_str())
                            .with_outcome(Outcome::Missing)
                            .with_details(serde_json::json!({ "error": err.to_string() })),
                    )?;
                }
                ObjectProbe {
                    name: name.clone(),
                    found: false,
                    address: None,
                }
            }
        };
        objects.push(probe);
    }
    if let Some(log) = log.as_deref_mut() {
        log.flush()?;
    }

    Ok(ProbeReport {
        source: selection.source,
        library: selection.library_display(),
        interface,
        objects,
    })
}
