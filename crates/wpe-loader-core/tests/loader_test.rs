//! Integration tests: backend resolution order, strategy selection and
//! one-time initialization of `Loader`.
//!
//! Run: cargo test -p wpe-loader-core --test loader_test

use std::collections::HashMap;
use std::ffi::{CStr, CString, OsStr, OsString};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use wpe_loader_core::{
    BackendLibrary, BackendSource, ErrorKind, LibraryOpener, Loader, LoaderConfig, LoaderState,
    MemorySink, ObjectAddr, ObjectLoader, PlatformError,
};

const INTERFACE_TABLE_ADDR: usize = 0x7000;
const SENTINEL: usize = 0xBEEF_0000;

// ---------------------------------------------------------------------------
// In-memory platform
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Calls {
    opened: Mutex<Vec<OsString>>,
    resolved: Mutex<Vec<CString>>,
    forwarded: Mutex<Vec<CString>>,
}

struct FakeLibrary {
    symbols: HashMap<CString, usize>,
    calls: Arc<Calls>,
}

impl BackendLibrary for FakeLibrary {
    fn resolve(&self, symbol: &CStr) -> Result<ObjectAddr, PlatformError> {
        self.calls.resolved.lock().push(symbol.to_owned());
        self.symbols
            .get(symbol)
            .and_then(|addr| ObjectAddr::new(*addr))
            .ok_or_else(|| PlatformError::new("undefined symbol"))
    }

    fn loader_interface(&self, table: ObjectAddr) -> Option<Box<dyn ObjectLoader>> {
        assert_eq!(table.get(), INTERFACE_TABLE_ADDR);
        Some(Box::new(FakeInterface {
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Returns `SENTINEL` for "bar" and empty for everything else.
struct FakeInterface {
    calls: Arc<Calls>,
}

impl ObjectLoader for FakeInterface {
    fn load_object(&self, name: &CStr) -> Result<ObjectAddr, wpe_loader_core::LoaderError> {
        self.calls.forwarded.lock().push(name.to_owned());
        if name == c"bar" {
            Ok(ObjectAddr::new(SENTINEL).unwrap())
        } else {
            Err(wpe_loader_core::LoaderError::object_not_found(name, None))
        }
    }

    fn is_interface(&self) -> bool {
        true
    }
}

struct FakeOpener {
    available: HashMap<OsString, HashMap<CString, usize>>,
    calls: Arc<Calls>,
    opens: Arc<AtomicUsize>,
    delay: Duration,
}

impl FakeOpener {
    fn new() -> Self {
        Self {
            available: HashMap::new(),
            calls: Arc::new(Calls::default()),
            opens: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    fn with_library(mut self, name: &str, symbols: &[(&str, usize)]) -> Self {
        let symbols = symbols
            .iter()
            .map(|(sym, addr)| (CString::new(*sym).unwrap(), *addr))
            .collect();
        self.available.insert(OsString::from(name), symbols);
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl LibraryOpener for FakeOpener {
    type Library = FakeLibrary;

    fn open(&self, name: &OsStr) -> Result<FakeLibrary, PlatformError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.calls.opened.lock().push(name.to_owned());
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        match self.available.get(name) {
            Some(symbols) => Ok(FakeLibrary {
                symbols: symbols.clone(),
                calls: Arc::clone(&self.calls),
            }),
            None => Err(PlatformError::new(format!(
                "{}: cannot open shared object file: No such file or directory",
                name.to_string_lossy()
            ))),
        }
    }
}

fn base_config() -> LoaderConfig {
    LoaderConfig::default().with_default_library("libWPEBackend-default.so")
}

// ---------------------------------------------------------------------------
// 1. Resolution order
// ---------------------------------------------------------------------------

#[test]
fn compile_time_backend_wins_and_does_not_fall_back() {
    let opener = FakeOpener::new()
        .with_library("libWPEBackend-env.so", &[("foo", 0x10)])
        .with_library("libWPEBackend-default.so", &[("foo", 0x20)]);
    let calls = Arc::clone(&opener.calls);
    let sink = Arc::new(MemorySink::new());
    let config = base_config()
        .with_env_backend("libWPEBackend-env.so")
        .with_compiled_backend("libWPEBackend-missing.so");
    let loader = Loader::with_sink(opener, config, sink.clone());

    let err = loader.load_object(c"foo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoBackendAvailable);
    assert_eq!(
        *calls.opened.lock(),
        vec![OsString::from("libWPEBackend-missing.so")]
    );
    assert_eq!(sink.count_matching("compile-time configured backend"), 1);
}

#[test]
fn compile_time_backend_never_reads_environment() {
    let lookups = AtomicUsize::new(0);
    let config = LoaderConfig::from_lookup(Some("libWPEBackend-fdo.so"), |_| {
        lookups.fetch_add(1, Ordering::SeqCst);
        Some(OsString::from("libWPEBackend-env.so"))
    });
    assert_eq!(lookups.load(Ordering::SeqCst), 0);

    let opener = FakeOpener::new().with_library("libWPEBackend-fdo.so", &[]);
    let loader = Loader::with_sink(opener, config, Arc::new(MemorySink::new()));
    assert_eq!(loader.backend().unwrap().source(), BackendSource::CompileTime);
}

#[test]
fn failing_environment_backend_does_not_fall_back_to_default() {
    let opener = FakeOpener::new().with_library("libWPEBackend-default.so", &[("foo", 0x20)]);
    let calls = Arc::clone(&opener.calls);
    let sink = Arc::new(MemorySink::new());
    let config = base_config().with_env_backend("/nonexistent/libWPEBackend-gone.so");
    let loader = Loader::with_sink(opener, config, sink.clone());

    for _ in 0..3 {
        let err = loader.load_object(c"foo").unwrap_err();
        assert!(err.is_fatal());
    }
    assert_eq!(
        *calls.opened.lock(),
        vec![OsString::from("/nonexistent/libWPEBackend-gone.so")]
    );
    assert_eq!(loader.state(), LoaderState::Failed);
    assert_eq!(sink.len(), 1);
    assert!(sink.snapshot()[0].to_string().starts_with(
        "wpe: could not load environment-variable-configured backend '/nonexistent/libWPEBackend-gone.so'"
    ));
}

#[test]
fn default_library_used_when_nothing_configured() {
    let opener = FakeOpener::new().with_library("libWPEBackend-default.so", &[("foo", 0x20)]);
    let loader = Loader::with_sink(opener, base_config(), Arc::new(MemorySink::new()));
    assert_eq!(loader.load_object(c"foo").map(ObjectAddr::get), Ok(0x20));
    assert_eq!(loader.backend().unwrap().source(), BackendSource::Default);
}

// ---------------------------------------------------------------------------
// 2. Direct symbol lookup
// ---------------------------------------------------------------------------

#[test]
fn missing_object_without_interface_reports_once_per_call() {
    let opener = FakeOpener::new().with_library("libWPEBackend-default.so", &[]);
    let calls = Arc::clone(&opener.calls);
    let sink = Arc::new(MemorySink::new());
    let loader = Loader::with_sink(opener, base_config(), sink.clone());

    let err = loader.load_object(c"foo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
    assert_eq!(loader.state(), LoaderState::ReadyWithoutInterface);
    assert_eq!(sink.count_matching("'foo'"), 1);
    assert_eq!(
        *calls.resolved.lock(),
        vec![
            CString::new("_wpe_loader_interface").unwrap(),
            CString::new("foo").unwrap()
        ]
    );

    // A later request is unaffected by the earlier failure.
    let _ = loader.load_object(c"foo");
    assert_eq!(sink.count_matching("'foo'"), 2);
}

#[test]
fn direct_lookup_passes_names_through_unchanged() {
    let opener = FakeOpener::new().with_library(
        "libWPEBackend-default.so",
        &[("_wpe_view_backend_interface", 0x30), ("wpe_renderer_host_interface", 0x40)],
    );
    let calls = Arc::clone(&opener.calls);
    let loader = Loader::with_sink(opener, base_config(), Arc::new(MemorySink::new()));

    assert_eq!(
        loader.load_object(c"_wpe_view_backend_interface").map(ObjectAddr::get),
        Ok(0x30)
    );
    assert_eq!(
        loader.load_object(c"wpe_renderer_host_interface").map(ObjectAddr::get),
        Ok(0x40)
    );
    let resolved = calls.resolved.lock();
    assert_eq!(resolved[1].as_c_str(), c"_wpe_view_backend_interface");
    assert_eq!(resolved[2].as_c_str(), c"wpe_renderer_host_interface");
}

// ---------------------------------------------------------------------------
// 3. Loader interface delegation
// ---------------------------------------------------------------------------

#[test]
fn interface_result_is_returned_verbatim() {
    let opener = FakeOpener::new().with_library(
        "libWPEBackend-default.so",
        &[("_wpe_loader_interface", INTERFACE_TABLE_ADDR), ("bar", 0x50)],
    );
    let calls = Arc::clone(&opener.calls);
    let loader = Loader::with_sink(opener, base_config(), Arc::new(MemorySink::new()));

    assert_eq!(loader.load_object(c"bar").map(ObjectAddr::get), Ok(SENTINEL));
    assert_eq!(loader.state(), LoaderState::ReadyWithInterface);
    assert!(loader.backend().unwrap().has_interface());
    assert_eq!(*calls.forwarded.lock(), vec![CString::new("bar").unwrap()]);
    // Only the interface symbol was looked up; "bar" went through the interface.
    assert_eq!(calls.resolved.lock().len(), 1);
}

#[test]
fn empty_interface_result_fails_the_request_without_a_diagnostic() {
    let opener = FakeOpener::new().with_library(
        "libWPEBackend-default.so",
        &[("_wpe_loader_interface", INTERFACE_TABLE_ADDR)],
    );
    let sink = Arc::new(MemorySink::new());
    let loader = Loader::with_sink(opener, base_config(), sink.clone());

    let err = loader.load_object(c"qux").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
    assert!(sink.is_empty());
    assert_eq!(loader.load_object(c"bar").map(ObjectAddr::get), Ok(SENTINEL));
}

// ---------------------------------------------------------------------------
// 4. One-time initialization
// ---------------------------------------------------------------------------

#[test]
fn resolution_runs_once_for_many_calls() {
    let opener = FakeOpener::new().with_library("libWPEBackend-default.so", &[("foo", 0x20)]);
    let opens = Arc::clone(&opener.opens);
    let loader = Loader::with_sink(opener, base_config(), Arc::new(MemorySink::new()));

    for _ in 0..1000 {
        assert!(loader.load_object(c"foo").is_ok());
    }
    assert_eq!(opens.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_first_calls_resolve_once() {
    const THREADS: usize = 16;

    let opener = FakeOpener::new()
        .with_library(
            "libWPEBackend-default.so",
            &[("_wpe_loader_interface", INTERFACE_TABLE_ADDR)],
        )
        .with_delay(Duration::from_millis(20));
    let opens = Arc::clone(&opener.opens);
    let calls = Arc::clone(&opener.calls);
    let loader = Arc::new(Loader::with_sink(
        opener,
        base_config(),
        Arc::new(MemorySink::new()),
    ));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loader.load_object(c"bar").map(ObjectAddr::get)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(SENTINEL));
    }
    assert_eq!(opens.load(Ordering::SeqCst), 1);
    let interface_lookups = calls
        .resolved
        .lock()
        .iter()
        .filter(|s| s.as_c_str() == c"_wpe_loader_interface")
        .count();
    assert_eq!(interface_lookups, 1);
    assert_eq!(calls.forwarded.lock().len(), THREADS);
}

#[test]
fn concurrent_first_calls_share_fatal_outcome() {
    const THREADS: usize = 8;

    let opener = FakeOpener::new().with_delay(Duration::from_millis(10));
    let opens = Arc::clone(&opener.opens);
    let sink = Arc::new(MemorySink::new());
    let loader = Arc::new(Loader::with_sink(opener, base_config(), sink.clone()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loader.load_object(c"foo").unwrap_err().kind()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ErrorKind::NoBackendAvailable);
    }
    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert_eq!(sink.len(), 1);
}
