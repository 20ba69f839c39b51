//! Backend library for tests.
//!
//! Built as a cdylib exporting `_wpe_loader_interface`, so the real dynamic
//! linker path (`dlopen` + `dlsym` of a data symbol + call through the table)
//! can be exercised end to end. The table serves a single object, `bar`.

#![allow(non_upper_case_globals)]

use std::ffi::{CStr, c_char, c_void};

/// Value stored behind the `bar` object.
pub const BAR_VALUE: u32 = 0x5E47;

static BAR_OBJECT: u32 = BAR_VALUE;

/// Same layout as the loader's interface table.
#[repr(C)]
pub struct FixtureInterface {
    pub load_object: Option<unsafe extern "C" fn(object_name: *const c_char) -> *mut c_void>,
}

unsafe extern "C" fn fixture_load_object(object_name: *const c_char) -> *mut c_void {
    if object_name.is_null() {
        return std::ptr::null_mut();
    }
    // SAFETY: non-null, and the loader passes NUL-terminated names.
    let name = unsafe { CStr::from_ptr(object_name) };
    if name == c"bar" {
        (&BAR_OBJECT as *const u32).cast_mut().cast()
    } else {
        std::ptr::null_mut()
    }
}

#[unsafe(no_mangle)]
pub static _wpe_loader_interface: FixtureInterface = FixtureInterface {
    load_object: Some(fixture_load_object),
};
