//! `_wpe_loader_interface` table.
//!
//! A backend may export this table to serve object requests itself instead of
//! exposing every object as a separate symbol. Only the leading `load_object`
//! entry is part of the contract; a backend may append fields after it.

use std::ffi::{CStr, c_char, c_void};

use wpe_loader_core::{LoaderError, ObjectAddr, ObjectLoader};

/// Function type of the interface's `load_object` entry.
pub type LoadObjectFn = unsafe extern "C" fn(object_name: *const c_char) -> *mut c_void;

/// Leading part of the table a backend exports as `_wpe_loader_interface`.
#[repr(C)]
pub struct LoaderInterface {
    pub load_object: Option<LoadObjectFn>,
}

/// Strategy forwarding every request to a backend's `load_object`.
#[derive(Debug, Clone, Copy)]
pub struct InterfaceForwarder {
    load_object: LoadObjectFn,
}

impl InterfaceForwarder {
    /// Bind the table at `table`.
    ///
    /// Returns `None` when the table's `load_object` entry is null.
    ///
    /// # Safety
    ///
    /// `table` must point to a readable `LoaderInterface` and the function it
    /// names must stay callable for the lifetime of the forwarder (the backend
    /// library must stay loaded).
    pub unsafe fn from_table(table: ObjectAddr) -> Option<Self> {
        let table = table.as_ptr().cast::<LoaderInterface>();
        // SAFETY: caller guarantees `table` addresses a live LoaderInterface.
        // Only the first field is read.
        let load_object = unsafe { (*table).load_object }?;
        Some(Self { load_object })
    }

    /// Forwarder calling `load_object` directly.
    pub fn from_fn(load_object: LoadObjectFn) -> Self {
        Self { load_object }
    }
}

impl ObjectLoader for InterfaceForwarder {
    fn load_object(&self, name: &CStr) -> Result<ObjectAddr, LoaderError> {
        // SAFETY: `name` is a valid NUL-terminated string for the duration of
        // the call; the function pointer came from a bound interface table.
        let object = unsafe { (self.load_object)(name.as_ptr()) };
        ObjectAddr::from_ptr(object).ok_or_else(|| LoaderError::object_not_found(name, None))
    }

    fn is_interface(&self) -> bool {
        true
    }
}
