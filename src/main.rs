//! tasksphere - personal task management CLI
//!
//! Local account with 24 hour sessions, a task board with projects and
//! subtasks, and a ranked focus list.

use clap::Parser;
use tasksphere::cli::Cli;
use tasksphere::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Tracing is opt-in via RUST_LOG; invalid or huge filters are ignored.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json;
    if let Err(err) = cli.run() {
        if let Err(write_err) = emit_error(&command, &err, json) {
            tracing::debug!(%write_err, "could not write error output");
        }
        std::process::exit(err.exit_code());
    }
}
