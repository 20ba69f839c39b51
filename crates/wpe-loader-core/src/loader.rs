//! Lazily initialized backend loader.
//!
//! Lifecycle: `UNINIT -> RESOLVING -> READY_INTERFACE | READY_DIRECT | FAILED`.
//! The first [`Loader::load_object`] (or [`Loader::backend`]) runs selection,
//! open and strategy binding inside a `OnceLock`. Concurrent first callers
//! block until that single resolution finishes and then share its outcome,
//! including a fatal one. Nothing is ever re-resolved.

use std::ffi::CStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::config::{BackendSelection, BackendSource, LoaderConfig};
use crate::diagnostics::{Diagnostic, DiagnosticSink, StderrSink};
use crate::error::LoaderError;
use crate::library::{BackendLibrary, LibraryOpener, ObjectAddr};
use crate::strategy::{LOADER_INTERFACE_SYMBOL, ObjectLoader, SymbolLookup};

const PHASE_UNINIT: u8 = 0;
const PHASE_RESOLVING: u8 = 1;
const PHASE_READY_INTERFACE: u8 = 2;
const PHASE_READY_DIRECT: u8 = 3;
const PHASE_FAILED: u8 = 4;

/// Observable loader lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderState {
    Uninitialized,
    Resolving,
    ReadyWithInterface,
    ReadyWithoutInterface,
    /// No backend could be opened. Terminal.
    Failed,
}

/// The opened backend and the strategy bound to it.
pub struct Backend<L> {
    selection: BackendSelection,
    // Declared before `library` so the strategy is dropped first.
    strategy: Box<dyn ObjectLoader>,
    library: Arc<L>,
}

impl<L> Backend<L> {
    #[must_use]
    pub fn source(&self) -> BackendSource {
        self.selection.source
    }

    #[must_use]
    pub fn selection(&self) -> &BackendSelection {
        &self.selection
    }

    #[must_use]
    pub fn has_interface(&self) -> bool {
        self.strategy.is_interface()
    }

    #[must_use]
    pub fn library(&self) -> &L {
        &self.library
    }
}

impl<L> std::fmt::Debug for Backend<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("selection", &self.selection)
            .field("interface", &self.strategy.is_interface())
            .finish_non_exhaustive()
    }
}

/// Opens one backend on first use and forwards object requests to it.
pub struct Loader<O: LibraryOpener> {
    opener: O,
    config: LoaderConfig,
    sink: Arc<dyn DiagnosticSink>,
    phase: AtomicU8,
    backend: OnceLock<Result<Backend<O::Library>, LoaderError>>,
}

impl<O: LibraryOpener> Loader<O> {
    /// Loader reporting to standard error.
    pub fn new(opener: O, config: LoaderConfig) -> Self {
        Self::with_sink(opener, config, Arc::new(StderrSink))
    }

    pub fn with_sink(opener: O, config: LoaderConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            opener,
            config,
            sink,
            phase: AtomicU8::new(PHASE_UNINIT),
            backend: OnceLock::new(),
        }
    }

    /// The library this loader commits to. Opens nothing.
    #[must_use]
    pub fn selection(&self) -> BackendSelection {
        match self.backend.get() {
            Some(Ok(backend)) => backend.selection.clone(),
            _ => self.config.select(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoaderState {
        match self.phase.load(Ordering::Acquire) {
            PHASE_RESOLVING => LoaderState::Resolving,
            PHASE_READY_INTERFACE => LoaderState::ReadyWithInterface,
            PHASE_READY_DIRECT => LoaderState::ReadyWithoutInterface,
            PHASE_FAILED => LoaderState::Failed,
            _ => LoaderState::Uninitialized,
        }
    }

    /// Resolve the backend if needed and return it.
    ///
    /// A fatal outcome is cached: every later call returns the same
    /// [`LoaderError::NoBackendAvailable`] without touching the platform.
    pub fn backend(&self) -> Result<&Backend<O::Library>, LoaderError> {
        self.backend
            .get_or_init(|| self.resolve())
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Produce the object called `object_name` from the backend.
    ///
    /// Direct lookup failures are reported to the sink once per call. An empty
    /// answer from a backend interface is returned without a diagnostic, since
    /// backends routinely answer null for objects they do not implement.
    pub fn load_object(&self, object_name: &CStr) -> Result<ObjectAddr, LoaderError> {
        let backend = self.backend()?;
        let result = backend.strategy.load_object(object_name);
        if let Err(err) = &result {
            if !backend.strategy.is_interface() {
                self.sink.report(&Diagnostic::from_error(err));
            }
        }
        result
    }

    fn resolve(&self) -> Result<Backend<O::Library>, LoaderError> {
        self.phase.store(PHASE_RESOLVING, Ordering::Release);
        let selection = self.config.select();

        let library = match self.opener.open(&selection.library) {
            Ok(library) => Arc::new(library),
            Err(err) => {
                let open_err = LoaderError::OpenFailed {
                    library: selection.library_display(),
                    context: selection.source.context_label(),
                    reason: err.reason,
                };
                self.sink.report(&Diagnostic::from_error(&open_err));
                self.phase.store(PHASE_FAILED, Ordering::Release);
                return Err(LoaderError::NoBackendAvailable {
                    source: Box::new(open_err),
                });
            }
        };

        // A missing interface symbol selects the direct lookup path; it is not
        // an error and is not reported.
        let strategy: Box<dyn ObjectLoader> = library
            .resolve(LOADER_INTERFACE_SYMBOL)
            .ok()
            .and_then(|table| library.loader_interface(table))
            .unwrap_or_else(|| {
                Box::new(SymbolLookup::new(Arc::clone(&library))) as Box<dyn ObjectLoader>
            });

        let phase = if strategy.is_interface() {
            PHASE_READY_INTERFACE
        } else {
            PHASE_READY_DIRECT
        };
        self.phase.store(phase, Ordering::Release);

        Ok(Backend {
            selection,
            strategy,
            library,
        })
    }
}
