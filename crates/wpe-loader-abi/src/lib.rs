// Extern "C" entry points take raw pointers from C callers and check them at
// runtime; per-function safety docs would repeat the same contract.
#![allow(clippy::missing_safety_doc)]
//! # wpe-loader-abi
//!
//! Platform side of the WPE backend loader.
//!
//! This crate produces a `cdylib` exporting `wpe_load_object`, plus an rlib
//! for Rust embedders. It contains:
//!
//! - [`platform`]: the library primitive (`dlopen`/`dlsym` on POSIX,
//!   `LoadLibraryW`/`GetProcAddress` on Windows).
//! - [`interface`]: the `_wpe_loader_interface` table layout and its
//!   forwarding strategy.
//! - [`report`]: the platform diagnostic sink (stderr, plus a modal dialog on
//!   Windows).
//! - [`loader_abi`]: the process-wide loader and the C export.
//!
//! # Architecture
//!
//! ```text
//! C caller -> wpe_load_object -> global Loader (wpe-loader-core) -> SystemLibrary
//! ```

pub mod interface;
pub mod loader_abi;
pub mod platform;
pub mod report;

pub use interface::{InterfaceForwarder, LoaderInterface};
pub use loader_abi::{global, load_object_or_abort, wpe_load_object};
pub use platform::{SystemLibrary, SystemOpener};
pub use report::PlatformSink;
