//! Host dynamic-library primitive.
//!
//! [`SystemOpener`] opens libraries and [`SystemLibrary`] resolves symbols in
//! them. Handles are never closed: a backend stays mapped for the life of the
//! process.

#[cfg(unix)]
mod posix;
#[cfg(unix)]
pub use posix::{SystemLibrary, SystemOpener};

#[cfg(windows)]
mod win32;
#[cfg(windows)]
pub use win32::{SystemLibrary, SystemOpener};
