//! chroma-version-analysis - check client/database compatibility and
//! generate a migration script for configurations missing `_type`.

use anyhow::Context;
use chroma_probe_cli::logging::init_logging;
use chroma_probe_cli::render::render_analysis;
use chroma_probe_cli::{exit_for_error, exit_for_health, write_json};
use chroma_probe_core::{analyze, AnalysisOptions, ClientBackend, EmbeddedClient};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "chroma-version-analysis", version)]
#[command(about = "Analyze Chroma version compatibility and repair stored configurations")]
struct Args {
    /// Path to the Chroma database directory
    db_path: PathBuf,

    /// Only analyze the collection with this name
    collection_name: Option<String>,

    /// Client version to assess (e.g. 0.6.3)
    #[arg(long, env = "CHROMA_CLIENT_VERSION")]
    client_version: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let backend = EmbeddedClient::new();
    let options = AnalysisOptions {
        collection: args.collection_name.clone(),
        client_version: args.client_version.clone(),
    };
    debug!("Analyzing {} with {:?}", args.db_path.display(), options);

    let report = analyze(&args.db_path, &backend, &options)?;

    let mut stdout = std::io::stdout().lock();
    if args.json {
        write_json(&mut stdout, &report)?;
    } else {
        render_analysis(&mut stdout, &report, backend.name()).context("Failed to write report")?;
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
