//! # wpe-loader-core
//!
//! Safe core of the WPE backend loader.
//!
//! The loader picks exactly one backend library at runtime, opens it once, and
//! forwards object requests to it. This crate owns everything that does not
//! touch the host's dynamic linker:
//!
//! - [`config`]: which library to open (compile-time name, `WPE_BACKEND_LIBRARY`,
//!   platform default) and the context label used in diagnostics.
//! - [`error`]: the loader error taxonomy.
//! - [`diagnostics`]: human-readable diagnostic records and sinks.
//! - [`library`]: traits the platform primitive implements.
//! - [`strategy`]: the object-loading capability and its direct-lookup variant.
//! - [`loader`]: the lazily initialized [`Loader`] service.
//!
//! # Architecture
//!
//! ```text
//! caller -> Loader::load_object -> (first call) select + open + bind strategy
//!                               -> strategy.load_object(name) -> address | error
//! ```
//!
//! The platform primitive (`dlopen`/`LoadLibraryW`) and the `extern "C"`
//! export live in `wpe-loader-abi`.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod library;
pub mod loader;
pub mod strategy;

pub use config::{BackendSelection, BackendSource, LoaderConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, NullSink, StderrSink};
pub use error::{ErrorKind, LoaderError, PlatformError};
pub use library::{BackendLibrary, LibraryOpener, ObjectAddr};
pub use loader::{Backend, Loader, LoaderState};
pub use strategy::{LOADER_INTERFACE_SYMBOL, ObjectLoader, SymbolLookup};
