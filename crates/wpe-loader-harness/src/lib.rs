//! Probe tooling for the WPE backend loader.
//!
//! This crate provides:
//! - [`probe`]: run a loader against a list of object names and summarize the
//!   outcome as a serializable report.
//! - [`structured_log`]: JSONL log records for probe runs.
//!
//! The `wpe-probe` binary wires both to the process-wide loader from
//! `wpe-loader-abi`.

#![forbid(unsafe_code)]

pub mod probe;
pub mod structured_log;

pub use probe::{ObjectProbe, ProbeError, ProbeReport, probe_objects};
pub use structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
