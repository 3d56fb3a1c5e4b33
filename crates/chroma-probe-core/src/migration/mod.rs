//! Migration artifacts: the corrective SQL script and the backup copy.
//!
//! The script is generated for manual review; nothing here executes it.

mod backup;
mod script;
mod writer;

pub use backup::{backup_path, create_backup, BackupOutcome};
pub use script::{script_path, sql_literal, MigrationScript, ScriptStatement};
pub use writer::write_atomic;

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Render `script` and write it to [`script_path`] for its database.
///
/// Returns the path written. A write failure is fatal to the run.
pub fn write_script(script: &MigrationScript) -> Result<PathBuf> {
    let path = script_path(&script.database_path);
    write_script_to(script, &path)?;
    Ok(path)
}

/// Render `script` and write it to an explicit path.
pub fn write_script_to(script: &MigrationScript, path: &Path) -> Result<()> {
    write_atomic(path, &script.render())?;
    info!(
        "Migration script with {} statements written to {}",
        script.statements.len(),
        path.display()
    );
    Ok(())
}
