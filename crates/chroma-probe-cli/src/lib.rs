//! Shared plumbing for the `chroma-diagnose` and `chroma-version-analysis`
//! binaries: logging setup, report rendering and exit-code mapping.

pub mod logging;
pub mod render;

use chroma_probe_core::ProbeError;
use serde::Serialize;
use std::io::Write;
use std::process::ExitCode;

/// Exit status for a healthy database.
pub const EXIT_OK: u8 = 0;
/// Exit status when issues were found or the run failed.
pub const EXIT_ISSUES: u8 = 1;
/// Exit status when the database path does not exist.
pub const EXIT_PATH_NOT_FOUND: u8 = 2;

/// Exit code for a completed run.
pub fn exit_for_health(healthy: bool) -> ExitCode {
    ExitCode::from(if healthy { EXIT_OK } else { EXIT_ISSUES })
}

/// Exit status for a run that stopped with an error.
pub fn error_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ProbeError>() {
        Some(ProbeError::PathNotFound(_)) => EXIT_PATH_NOT_FOUND,
        _ => EXIT_ISSUES,
    }
}

pub fn exit_for_error(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(error_status(err))
}

/// Write `report` as pretty JSON followed by a newline.
pub fn write_json<T: Serialize>(out: &mut impl Write, report: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
