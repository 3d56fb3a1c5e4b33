//! Backup copy of a database directory.

use crate::config::MigrationConfig;
use crate::error::{ProbeError, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// What [`create_backup`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BackupOutcome {
    Created {
        path: PathBuf,
        files: usize,
        bytes: u64,
    },
    /// A backup already exists and was left untouched.
    AlreadyExists { path: PathBuf },
}

impl BackupOutcome {
    pub fn path(&self) -> &Path {
        match self {
            BackupOutcome::Created { path, .. } | BackupOutcome::AlreadyExists { path } => path,
        }
    }
}

/// `<database_path>_backup`.
pub fn backup_path(database_path: &Path) -> PathBuf {
    // Rebuilding from components drops a trailing separator
    let normalized: PathBuf = database_path.components().collect();
    let mut name = normalized.into_os_string();
    name.push(MigrationConfig::BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Recursively copy the database directory to [`backup_path`] unless a
/// backup is already there.
///
/// The copy is staged in a temporary directory next to the destination and
/// renamed into place only once complete, so a failed copy leaves nothing at
/// [`backup_path`].
pub fn create_backup(database_path: &Path) -> Result<BackupOutcome> {
    copy_with(database_path, |from, to| fs::copy(from, to))
}

fn copy_with<F>(database_path: &Path, copy_file: F) -> Result<BackupOutcome>
where
    F: Fn(&Path, &Path) -> io::Result<u64>,
{
    let dest = backup_path(database_path);
    if dest.exists() {
        debug!("Backup already present at {}", dest.display());
        return Ok(BackupOutcome::AlreadyExists { path: dest });
    }
    if !database_path.is_dir() {
        return Err(ProbeError::PathNotFound(database_path.to_path_buf()));
    }

    let backup_error = |message: String| ProbeError::Backup {
        src: database_path.to_path_buf(),
        dest: dest.clone(),
        message,
    };

    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    // Removed on drop, including when the walk below bails out
    let staging = tempfile::Builder::new()
        .prefix(".chroma-backup-")
        .tempdir_in(parent)
        .map_err(|e| backup_error(format!("{}: {}", parent.display(), e)))?;

    let mut files = 0usize;
    let mut bytes = 0u64;

    for entry in WalkDir::new(database_path).follow_links(false) {
        let entry = entry.map_err(|e| backup_error(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(database_path)
            .map_err(|e| backup_error(e.to_string()))?;
        let target = staging.path().join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| backup_error(format!("{}: {}", target.display(), e)))?;
        } else if entry.file_type().is_file() {
            bytes += copy_file(entry.path(), &target)
                .map_err(|e| backup_error(format!("{}: {}", entry.path().display(), e)))?;
            files += 1;
        } else {
            debug!("Skipping non-regular entry {}", entry.path().display());
        }
    }

    // Staging directories are created private; match the source instead
    let permissions = fs::metadata(database_path)
        .map_err(|e| backup_error(format!("{}: {}", database_path.display(), e)))?
        .permissions();
    fs::set_permissions(staging.path(), permissions)
        .map_err(|e| backup_error(format!("{}: {}", staging.path().display(), e)))?;

    fs::rename(staging.path(), &dest)
        .map_err(|e| backup_error(format!("{}: {}", dest.display(), e)))?;

    info!(
        "Backed up {} files ({} bytes) to {}",
        files,
        bytes,
        dest.display()
    );
    Ok(BackupOutcome::Created {
        path: dest,
        files,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/data/chroma")),
            PathBuf::from("/data/chroma_backup")
        );
        assert_eq!(
            backup_path(Path::new("/data/chroma/")),
            PathBuf::from("/data/chroma_backup")
        );
    }

    #[test]
    fn test_create_backup_copies_tree() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("chroma");
        fs::create_dir_all(db.join("segment-1")).unwrap();
        fs::write(db.join("chroma.sqlite3"), vec![1u8; 10]).unwrap();
        fs::write(db.join("segment-1").join("header.bin"), vec![2u8; 5]).unwrap();

        let outcome = create_backup(&db).unwrap();
        assert_eq!(
            outcome,
            BackupOutcome::Created {
                path: temp.path().join("chroma_backup"),
                files: 2,
                bytes: 15,
            }
        );
        assert_eq!(
            fs::read(temp.path().join("chroma_backup/segment-1/header.bin")).unwrap(),
            vec![2u8; 5]
        );
    }

    #[test]
    fn test_existing_backup_is_kept() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("chroma");
        fs::create_dir_all(&db).unwrap();
        fs::write(db.join("chroma.sqlite3"), b"new").unwrap();
        fs::create_dir_all(temp.path().join("chroma_backup")).unwrap();
        fs::write(temp.path().join("chroma_backup/chroma.sqlite3"), b"old").unwrap();

        let outcome = create_backup(&db).unwrap();
        assert!(matches!(outcome, BackupOutcome::AlreadyExists { .. }));
        assert_eq!(
            fs::read(temp.path().join("chroma_backup/chroma.sqlite3")).unwrap(),
            b"old"
        );
    }

    #[test]
    fn test_failed_copy_leaves_no_backup() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("chroma");
        fs::create_dir_all(db.join("segment-1")).unwrap();
        fs::write(db.join("chroma.sqlite3"), b"db").unwrap();
        fs::write(db.join("segment-1").join("data.bin"), b"vectors").unwrap();

        let err = copy_with(&db, |from, to| {
            if from.ends_with("data.bin") {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            } else {
                fs::copy(from, to)
            }
        })
        .unwrap_err();
        assert!(matches!(err, ProbeError::Backup { .. }));
        assert!(!err.is_fatal());

        // Nothing left behind: no destination and no staging directory
        assert!(!temp.path().join("chroma_backup").exists());
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("chroma")]);

        // The next run makes a real backup instead of reporting a stale one
        let outcome = create_backup(&db).unwrap();
        assert!(matches!(outcome, BackupOutcome::Created { files: 2, .. }));
    }

    #[test]
    fn test_backup_of_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = create_backup(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, ProbeError::PathNotFound(_)));
    }
}
