//! Atomic artifact writes.
//!
//! The script is written to a temp file in the destination directory, synced,
//! then renamed over the target, so a reader never sees a half-written script.
//! An existing file at the target is replaced without warning.

use crate::error::{ProbeError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `contents` to `path`, replacing any existing file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let script_write = |source: std::io::Error| ProbeError::ScriptWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(parent).map_err(script_write)?;
    temp.write_all(contents.as_bytes()).map_err(script_write)?;
    temp.flush().map_err(script_write)?;
    temp.as_file().sync_all().map_err(script_write)?;

    temp.persist(path).map_err(|e| script_write(e.error))?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
