//! Platform diagnostic sink.
//!
//! Every diagnostic goes to standard error. On Windows it is also shown in a
//! blocking modal dialog, since console output of GUI processes is usually
//! not visible there.

use wpe_loader_core::{Diagnostic, DiagnosticSink, StderrSink};

/// Sink used by the process-wide loader.
#[derive(Debug, Clone, Copy)]
pub struct PlatformSink {
    modal: bool,
}

impl Default for PlatformSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformSink {
    /// Stderr plus, on Windows, a modal dialog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modal: cfg!(windows),
        }
    }

    /// Stderr only, on every platform.
    #[must_use]
    pub const fn console_only() -> Self {
        Self { modal: false }
    }

    #[must_use]
    pub const fn is_modal(&self) -> bool {
        self.modal
    }
}

impl DiagnosticSink for PlatformSink {
    fn report(&self, diagnostic: &Diagnostic) {
        StderrSink.report(diagnostic);
        if self.modal {
            show_error_dialog(&diagnostic.to_string());
        }
    }
}

#[cfg(windows)]
fn show_error_dialog(message: &str) {
    use windows::{
        Win32::{
            Foundation::HWND,
            UI::WindowsAndMessaging::{MB_ICONERROR, MB_OK, MessageBoxW},
        },
        core::{PCWSTR, w},
    };

    let msg_wide: Vec<u16> = message.encode_utf16().chain(std::iter::once(0)).collect();
    // SAFETY: msg_wide is a NUL-terminated UTF-16 string alive for the call.
    // A null owner HWND gives an unowned dialog. The pressed button is ignored.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            w!("Error"),
            MB_OK | MB_ICONERROR,
        );
    }
}

#[cfg(not(windows))]
fn show_error_dialog(_message: &str) {}
