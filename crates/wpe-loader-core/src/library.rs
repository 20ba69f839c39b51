//! Platform library primitive, as seen by the loader.
//!
//! `wpe-loader-abi` implements these traits over `dlopen`/`dlsym` and
//! `LoadLibraryW`/`GetProcAddress`. Tests implement them in memory.

use std::ffi::{CStr, OsStr, c_void};
use std::num::NonZeroUsize;

use crate::error::PlatformError;
use crate::strategy::ObjectLoader;

/// Non-null address of an object handed out by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectAddr(NonZeroUsize);

impl ObjectAddr {
    #[must_use]
    pub const fn new(addr: usize) -> Option<Self> {
        match NonZeroUsize::new(addr) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// `None` for a null pointer.
    #[must_use]
    pub fn from_ptr<T>(ptr: *const T) -> Option<Self> {
        Self::new(ptr as usize)
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    #[must_use]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.get() as *mut c_void
    }
}

impl std::fmt::Display for ObjectAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// An opened backend library.
///
/// The loader never closes it; dropping is only expected at process exit.
pub trait BackendLibrary: Send + Sync + 'static {
    /// Look up `symbol` by its exact name.
    fn resolve(&self, symbol: &CStr) -> Result<ObjectAddr, PlatformError>;

    /// Bind the loader-interface table found at `table`.
    ///
    /// Returns `None` if the table cannot serve requests (for instance a null
    /// `load_object` entry), in which case direct symbol lookup is used.
    fn loader_interface(&self, table: ObjectAddr) -> Option<Box<dyn ObjectLoader>>;
}

/// Opens backend libraries by name or path.
pub trait LibraryOpener: Send + Sync {
    type Library: BackendLibrary;

    fn open(&self, name: &OsStr) -> Result<Self::Library, PlatformError>;
}
