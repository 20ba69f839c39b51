//! Loader error taxonomy.

use serde::Serialize;
use thiserror::Error;

/// Reason text produced by the host's dynamic linker (`dlerror()` or the
/// formatted Win32 error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct PlatformError {
    pub reason: String,
}

impl PlatformError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Coarse classification of a [`LoaderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    OpenFailed,
    SymbolNotFound,
    NoBackendAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// The selected library could not be opened.
    #[error("could not load {context} '{library}': {reason}")]
    OpenFailed {
        library: String,
        context: &'static str,
        reason: String,
    },
    /// A requested object is not provided by the backend.
    #[error("failed to load object with name '{name}'{}", reason_suffix(.reason))]
    SymbolNotFound {
        name: String,
        reason: Option<String>,
    },
    /// No backend library could be opened; the loader cannot work.
    #[error("no backend library available: {source}")]
    NoBackendAvailable { source: Box<LoaderError> },
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(": {reason}"),
        None => String::new(),
    }
}

impl LoaderError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OpenFailed { .. } => ErrorKind::OpenFailed,
            Self::SymbolNotFound { .. } => ErrorKind::SymbolNotFound,
            Self::NoBackendAvailable { .. } => ErrorKind::NoBackendAvailable,
        }
    }

    /// True for errors after which no object can ever be loaded.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NoBackendAvailable { .. })
    }

    pub fn object_not_found(name: &std::ffi::CStr, reason: Option<PlatformError>) -> Self {
        Self::SymbolNotFound {
            name: name.to_string_lossy().into_owned(),
            reason: reason.map(|e| e.reason),
        }
    }
}
