//! `LoadLibraryW`/`GetProcAddress` backed primitive.

use std::ffi::{CStr, OsStr};
use std::os::windows::ffi::OsStrExt;

use windows::{
    Win32::{
        Foundation::HMODULE,
        System::LibraryLoader::{GetProcAddress, LoadLibraryW},
    },
    core::{PCSTR, PCWSTR},
};
use wpe_loader_core::{BackendLibrary, LibraryOpener, ObjectAddr, ObjectLoader, PlatformError};

use crate::interface::InterfaceForwarder;

/// Opens libraries with `LoadLibraryW` using the default DLL search order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

/// A loaded module handle. `FreeLibrary` is never called on it.
#[derive(Debug)]
pub struct SystemLibrary {
    module: HMODULE,
}

// SAFETY: an HMODULE is a process-wide module base address; GetProcAddress is
// thread-safe.
unsafe impl Send for SystemLibrary {}
// SAFETY: see above; SystemLibrary exposes no interior mutability.
unsafe impl Sync for SystemLibrary {}

/// Formatted text for the calling thread's last Win32 error.
fn last_error_message() -> String {
    let err = windows::core::Error::from_win32();
    err.message().to_string()
}

impl LibraryOpener for SystemOpener {
    type Library = SystemLibrary;

    fn open(&self, name: &OsStr) -> Result<SystemLibrary, PlatformError> {
        let wide: Vec<u16> = name.encode_wide().chain(std::iter::once(0)).collect();
        if wide[..wide.len() - 1].contains(&0) {
            return Err(PlatformError::new("library name contains an interior NUL"));
        }
        // The loader names the library in its diagnostic; the reason is the
        // system message only.
        // SAFETY: wide is a NUL-terminated UTF-16 string that outlives the call.
        let module = unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) }
            .map_err(|err| PlatformError::new(err.message().to_string()))?;
        Ok(SystemLibrary { module })
    }
}

impl BackendLibrary for SystemLibrary {
    fn resolve(&self, symbol: &CStr) -> Result<ObjectAddr, PlatformError> {
        // SAFETY: module came from a successful LoadLibraryW and is never
        // freed; symbol is a valid NUL-terminated ANSI string.
        let proc = unsafe { GetProcAddress(self.module, PCSTR(symbol.as_ptr().cast())) };
        proc.and_then(|f| ObjectAddr::new(f as usize))
            .ok_or_else(|| PlatformError::new(last_error_message()))
    }

    fn loader_interface(&self, table: ObjectAddr) -> Option<Box<dyn ObjectLoader>> {
        // SAFETY: `table` is the exported `_wpe_loader_interface` object of a
        // module that is never unloaded.
        let forwarder = unsafe { InterfaceForwarder::from_table(table) }?;
        Some(Box::new(forwarder))
    }
}
