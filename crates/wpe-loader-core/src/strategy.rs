//! Object-loading strategies.
//!
//! A strategy is picked once when the backend is opened:
//! - the backend exports `_wpe_loader_interface`: requests go to its
//!   `load_object` (bound by the platform crate, see
//!   [`BackendLibrary::loader_interface`]);
//! - otherwise: [`SymbolLookup`] resolves each object name as a symbol.

use std::ffi::CStr;
use std::sync::Arc;

use crate::error::LoaderError;
use crate::library::{BackendLibrary, ObjectAddr};

/// Exported symbol naming the optional loader-interface table.
pub const LOADER_INTERFACE_SYMBOL: &CStr = c"_wpe_loader_interface";

/// The capability every strategy provides.
pub trait ObjectLoader: Send + Sync {
    /// Produce the object called `name`. The name is passed on unchanged.
    fn load_object(&self, name: &CStr) -> Result<ObjectAddr, LoaderError>;

    /// True when requests are forwarded to a backend-provided interface.
    fn is_interface(&self) -> bool {
        false
    }
}

/// Direct symbol lookup in the opened library.
pub struct SymbolLookup<L> {
    library: Arc<L>,
}

impl<L: BackendLibrary> SymbolLookup<L> {
    pub fn new(library: Arc<L>) -> Self {
        Self { library }
    }
}

impl<L: BackendLibrary> ObjectLoader for SymbolLookup<L> {
    fn load_object(&self, name: &CStr) -> Result<ObjectAddr, LoaderError> {
        self.library
            .resolve(name)
            .map_err(|err| LoaderError::object_not_found(name, Some(err)))
    }
}
