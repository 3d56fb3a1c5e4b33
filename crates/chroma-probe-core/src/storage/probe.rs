//! Directory listing and storage file discovery.

use crate::config::StorageConfig;
use crate::error::{ProbeError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Classification of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    /// Anything whose metadata could not be resolved (e.g. a dangling symlink).
    Other,
}

/// An immediate child of the probed directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Byte size, present for files only.
    pub size_bytes: Option<u64>,
}

/// Immediate children of a database directory, sorted by name.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    pub path: PathBuf,
    pub entries: Vec<DirectoryEntry>,
}

impl DirectoryListing {
    /// Entry names that look like they could be a SQLite file.
    pub fn potential_storage_files(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .map(|entry| entry.name.as_str())
            .filter(|name| is_potential_storage_name(name))
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .count()
    }
}

fn is_potential_storage_name(name: &str) -> bool {
    StorageConfig::POTENTIAL_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
        || name
            .to_lowercase()
            .contains(StorageConfig::POTENTIAL_NAME_MARKER)
}

/// List the immediate children of `path`.
///
/// Fails with [`ProbeError::PathNotFound`] when nothing exists at `path` and
/// with [`ProbeError::NotADirectory`] when it is not a directory.
pub fn probe_directory(path: &Path) -> Result<DirectoryListing> {
    if !path.exists() {
        return Err(ProbeError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ProbeError::NotADirectory(path.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| ProbeError::io_with_path(e, path))? {
        let entry = entry.map_err(|e| ProbeError::io_with_path(e, path))?;
        let name = entry.file_name().to_string_lossy().into_owned();

        // Follow symlinks so a linked storage file is reported as a file.
        let (kind, size_bytes) = match fs::metadata(entry.path()) {
            Ok(meta) if meta.is_file() => (EntryKind::File, Some(meta.len())),
            Ok(meta) if meta.is_dir() => (EntryKind::Directory, None),
            Ok(_) => (EntryKind::Other, None),
            Err(e) => {
                debug!("Could not stat {}: {}", entry.path().display(), e);
                (EntryKind::Other, None)
            }
        };

        entries.push(DirectoryEntry {
            name,
            kind,
            size_bytes,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Probed {} entries in {}", entries.len(), path.display());

    Ok(DirectoryListing {
        path: path.to_path_buf(),
        entries,
    })
}

/// Find the embedded storage file inside a database directory.
///
/// Tries [`StorageConfig::CANDIDATE_FILE_NAMES`] in order, then the first file
/// (by name) carrying the fallback extension. Returns `None` when nothing
/// matches or the directory cannot be read.
pub fn locate_storage_file(dir: &Path) -> Option<PathBuf> {
    for candidate in StorageConfig::CANDIDATE_FILE_NAMES {
        let candidate_path = dir.join(candidate);
        if candidate_path.is_file() {
            debug!("Found storage file candidate {}", candidate_path.display());
            return Some(candidate_path);
        }
    }

    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!("Could not scan {} for storage files: {}", dir.display(), e);
            return None;
        }
    };

    let mut matches: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext == StorageConfig::FALLBACK_EXTENSION)
                    .unwrap_or(false)
        })
        .collect();
    matches.sort();

    matches.into_iter().next()
}
