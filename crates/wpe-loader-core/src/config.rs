//! Backend library selection.
//!
//! The backend is chosen from three tiers, first applicable wins:
//! - `WPE_BACKEND` at build time (compile-time configured backend). When set,
//!   nothing else is consulted.
//! - `WPE_BACKEND_LIBRARY` in the process environment, if present and non-empty.
//! - The platform default filename (`libWPEBackend-default.so` on POSIX,
//!   `WPEBackend-default.dll` on Windows).
//!
//! The chosen tier is final. A failed open never falls through to a later tier.

use std::ffi::{OsStr, OsString};

use serde::Serialize;

/// Environment variable naming the backend library to open.
pub const BACKEND_LIBRARY_ENV: &str = "WPE_BACKEND_LIBRARY";

/// Backend library name fixed at build time, if any.
pub const COMPILED_BACKEND: Option<&str> = option_env!("WPE_BACKEND");

/// Library opened when neither the compile-time nor the environment tier applies.
#[cfg(windows)]
pub const DEFAULT_BACKEND_LIBRARY: &str = "WPEBackend-default.dll";
/// Library opened when neither the compile-time nor the environment tier applies.
#[cfg(not(windows))]
pub const DEFAULT_BACKEND_LIBRARY: &str = "libWPEBackend-default.so";

/// Which resolution tier produced the library name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSource {
    CompileTime,
    Environment,
    Default,
}

impl BackendSource {
    /// Label embedded in open-failure diagnostics.
    #[must_use]
    pub const fn context_label(self) -> &'static str {
        match self {
            Self::CompileTime => "compile-time configured backend",
            Self::Environment => "environment-variable-configured backend",
            Self::Default => "default backend library",
        }
    }
}

/// The library the loader commits to opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendSelection {
    pub source: BackendSource,
    #[serde(serialize_with = "serialize_os_str")]
    pub library: OsString,
}

impl BackendSelection {
    /// Library name as UTF-8, lossily converted for display.
    #[must_use]
    pub fn library_display(&self) -> String {
        self.library.to_string_lossy().into_owned()
    }
}

fn serialize_os_str<S: serde::Serializer>(value: &OsStr, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string_lossy())
}

/// Inputs to backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    compiled_backend: Option<OsString>,
    env_backend: Option<OsString>,
    default_library: OsString,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            compiled_backend: None,
            env_backend: None,
            default_library: OsString::from(DEFAULT_BACKEND_LIBRARY),
        }
    }
}

impl LoaderConfig {
    /// Build from [`COMPILED_BACKEND`] and the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(COMPILED_BACKEND, |key| std::env::var_os(key))
    }

    /// Build from an explicit compile-time name and an environment lookup.
    ///
    /// `lookup` is only called when `compiled` is absent or empty.
    pub fn from_lookup<F>(compiled: Option<&str>, lookup: F) -> Self
    where
        F: FnOnce(&str) -> Option<OsString>,
    {
        let compiled_backend = compiled.filter(|name| !name.is_empty()).map(OsString::from);
        let env_backend = if compiled_backend.is_some() {
            None
        } else {
            lookup(BACKEND_LIBRARY_ENV).filter(|value| !value.is_empty())
        };
        Self {
            compiled_backend,
            env_backend,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_compiled_backend(mut self, name: impl Into<OsString>) -> Self {
        self.compiled_backend = Some(name.into()).filter(|n| !n.is_empty());
        self
    }

    #[must_use]
    pub fn with_env_backend(mut self, name: impl Into<OsString>) -> Self {
        self.env_backend = Some(name.into()).filter(|n| !n.is_empty());
        self
    }

    #[must_use]
    pub fn with_default_library(mut self, name: impl Into<OsString>) -> Self {
        self.default_library = name.into();
        self
    }

    /// Apply the resolution order.
    #[must_use]
    pub fn select(&self) -> BackendSelection {
        if let Some(name) = &self.compiled_backend {
            return BackendSelection {
                source: BackendSource::CompileTime,
                library: name.clone(),
            };
        }
        if let Some(name) = &self.env_backend {
            return BackendSelection {
                source: BackendSource::Environment,
                library: name.clone(),
            };
        }
        BackendSelection {
            source: BackendSource::Default,
            library: self.default_library.clone(),
        }
    }
}
