//! `dlopen`/`dlsym` backed primitive.

use std::ffi::{CStr, CString, OsStr, c_void};
use std::os::unix::ffi::OsStrExt;
use std::ptr::NonNull;

use wpe_loader_core::{BackendLibrary, LibraryOpener, ObjectAddr, ObjectLoader, PlatformError};

use crate::interface::InterfaceForwarder;

/// Fallback text when the dynamic linker leaves no `dlerror()` message.
const UNDEFINED_SYMBOL: &str = "undefined symbol";

/// Opens libraries with `dlopen(name, RTLD_NOW)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

/// A `dlopen` handle.
#[derive(Debug)]
pub struct SystemLibrary {
    handle: NonNull<c_void>,
}

// SAFETY: a dlopen handle is a process-global token; dlsym may be called on it
// from any thread.
unsafe impl Send for SystemLibrary {}
// SAFETY: see above; SystemLibrary exposes no interior mutability.
unsafe impl Sync for SystemLibrary {}

/// Take the pending `dlerror()` message, if any.
fn take_dlerror() -> Option<String> {
    // SAFETY: dlerror returns null or a NUL-terminated thread-local string that
    // stays valid until the next dl* call on this thread; it is copied out
    // immediately.
    let msg = unsafe { libc::dlerror() };
    if msg.is_null() {
        None
    } else {
        // SAFETY: non-null dlerror result is a valid C string.
        Some(unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned())
    }
}

impl LibraryOpener for SystemOpener {
    type Library = SystemLibrary;

    fn open(&self, name: &OsStr) -> Result<SystemLibrary, PlatformError> {
        let c_name = CString::new(name.as_bytes())
            .map_err(|_| PlatformError::new("library name contains an interior NUL byte"))?;

        // Clear any stale message so a failure below reports its own reason.
        let _ = take_dlerror();
        // SAFETY: c_name is a valid NUL-terminated string that outlives the call.
        let handle = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_NOW) };
        match NonNull::new(handle) {
            Some(handle) => Ok(SystemLibrary { handle }),
            None => Err(PlatformError::new(
                take_dlerror().unwrap_or_else(|| "dlopen failed".to_owned()),
            )),
        }
    }
}

impl BackendLibrary for SystemLibrary {
    fn resolve(&self, symbol: &CStr) -> Result<ObjectAddr, PlatformError> {
        let _ = take_dlerror();
        // SAFETY: handle came from a successful dlopen and is never closed;
        // symbol is a valid C string.
        let addr = unsafe { libc::dlsym(self.handle.as_ptr(), symbol.as_ptr()) };
        ObjectAddr::from_ptr(addr).ok_or_else(|| {
            PlatformError::new(take_dlerror().unwrap_or_else(|| UNDEFINED_SYMBOL.to_owned()))
        })
    }

    fn loader_interface(&self, table: ObjectAddr) -> Option<Box<dyn ObjectLoader>> {
        // SAFETY: `table` is the address of the exported `_wpe_loader_interface`
        // object in this library, which stays loaded for the life of the process.
        let forwarder = unsafe { InterfaceForwarder::from_table(table) }?;
        Some(Box::new(forwarder))
    }
}
