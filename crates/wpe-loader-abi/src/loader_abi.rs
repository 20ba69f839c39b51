//! Process-wide loader and the `wpe_load_object` C export.
//!
//! The loader is built on first use from `LoaderConfig::from_env()`, so
//! `WPE_BACKEND_LIBRARY` is read at the first object request, not at library
//! load time. If no backend can be opened the process aborts; the diagnostic
//! has already been written by then.

use std::ffi::{CStr, c_char, c_void};
use std::sync::{Arc, OnceLock};

use wpe_loader_core::{Diagnostic, DiagnosticSink, Loader, LoaderConfig, LoaderError, ObjectAddr};

use crate::platform::SystemOpener;
use crate::report::PlatformSink;

static LOADER: OnceLock<Loader<SystemOpener>> = OnceLock::new();

/// The process-wide loader.
pub fn global() -> &'static Loader<SystemOpener> {
    LOADER.get_or_init(|| {
        Loader::with_sink(
            SystemOpener,
            LoaderConfig::from_env(),
            Arc::new(PlatformSink::new()),
        )
    })
}

/// Load `object_name` through the process-wide loader.
///
/// Returns `None` for a per-request failure (already reported). Aborts the
/// process when no backend library could be opened.
pub fn load_object_or_abort(object_name: &CStr) -> Option<ObjectAddr> {
    match global().load_object(object_name) {
        Ok(object) => Some(object),
        Err(err) if err.is_fatal() => std::process::abort(),
        Err(_) => None,
    }
}

/// Load an object from the selected backend.
///
/// Returns null if the backend does not provide `object_name`. A null
/// `object_name` is reported and yields null without touching the backend.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wpe_load_object(object_name: *const c_char) -> *mut c_void {
    if object_name.is_null() {
        let err = LoaderError::object_not_found(c"(null)", None);
        PlatformSink::new().report(&Diagnostic::from_error(&err));
        return std::ptr::null_mut();
    }
    // SAFETY: non-null, and the C caller guarantees a NUL-terminated string.
    let name = unsafe { CStr::from_ptr(object_name) };
    load_object_or_abort(name).map_or(std::ptr::null_mut(), ObjectAddr::as_ptr)
}
