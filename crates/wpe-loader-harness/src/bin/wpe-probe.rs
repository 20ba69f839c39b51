//! CLI entrypoint for probing WPE backend libraries.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use wpe_loader_core::LoaderConfig;
use wpe_loader_harness::{LogEmitter, probe_objects};

/// Inspect which WPE backend the loader selects and what it exports.
#[derive(Debug, Parser)]
#[command(name = "wpe-probe")]
#[command(about = "Probe WPE backend selection and object loading")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the backend selection without opening anything.
    Select {
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load objects through the process-wide loader.
    Load {
        /// Object name to request; repeat for several.
        #[arg(long = "object", required = true)]
        objects: Vec<String>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let body = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{body}\n"))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Select { output } => {
            let selection = LoaderConfig::from_env().select();
            write_json(&selection, output.as_deref())?;
        }
        Command::Load {
            objects,
            log,
            output,
        } => {
            let mut emitter = match &log {
                Some(path) => Some(LogEmitter::to_file(path, "wpe-probe")?),
                None => None,
            };
            let report = match probe_objects(wpe_loader_abi::global(), &objects, emitter.as_mut()) {
                Ok(report) => report,
                // Same policy as `wpe_load_object`: the diagnostic is out, stop hard.
                Err(err) if err.is_fatal() => std::process::abort(),
                Err(err) => return Err(err.into()),
            };
            write_json(&report, output.as_deref())?;
        }
    }

    Ok(())
}
