//! chroma-diagnose - inspect a Chroma database directory and test whether a
//! client can open it.

use anyhow::Context;
use chroma_probe_cli::logging::init_logging;
use chroma_probe_cli::render::render_diagnosis;
use chroma_probe_cli::{exit_for_error, exit_for_health, write_json};
use chroma_probe_core::{diagnose, ClientBackend, EmbeddedClient};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "chroma-diagnose", version)]
#[command(about = "Diagnose a Chroma database directory")]
struct Args {
    /// Path to the Chroma database directory
    db_path: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let backend = EmbeddedClient::new();
    debug!("Diagnosing {} with {} client", args.db_path.display(), backend.name());

    let report = diagnose(&args.db_path, &backend)?;

    let mut stdout = std::io::stdout().lock();
    if args.json {
        write_json(&mut stdout, &report)?;
    } else {
        render_diagnosis(&mut stdout, &report, backend.name()).context("Failed to write report")?;
    }
    Ok(report.is_compatible())
}

fn main() -> ExitCode {
    // Usage errors exit with status 2 from clap
    let args = Args::parse();
    init_logging(args.debug, args.json);

    match run(&args) {
        Ok(healthy) => exit_for_health(healthy),
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            exit_for_error(&e)
        }
    }
}
