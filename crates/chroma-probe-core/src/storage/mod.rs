//! Direct access to a Chroma database directory and its SQLite storage file.
//!
//! Every function here opens its own short-lived connection and closes it
//! before returning; no connection outlives a single step.

mod inspect;
mod probe;
mod records;

pub use inspect::{
    inspect_schema, try_inspect_schema, ColumnInfo, CollectionsTable, SampledCollection,
    SampledConfiguration, SchemaReport,
};
pub use probe::{
    locate_storage_file, probe_directory, DirectoryEntry, DirectoryListing, EntryKind,
};
pub use records::{read_collections, CollectionRecord};

use crate::error::{ProbeError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use std::path::Path;

/// Open a storage file read-only and confirm it is a SQLite database.
///
/// SQLite defers header validation until the first statement, so the schema
/// table is touched here to surface "file is not a database" as an open failure.
pub(crate) fn open_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| ProbeError::StorageOpen {
        path: path.to_path_buf(),
        source,
    })?;

    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(|source| ProbeError::StorageOpen {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(conn)
}

/// Names of all tables in the storage file.
pub(crate) fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Read a column as text regardless of its stored SQLite type.
pub(crate) fn column_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(column_optional_text(row, idx)?.unwrap_or_default())
}

/// Read a nullable column as text; blobs are decoded lossily.
pub(crate) fn column_optional_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    let text = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    };
    Ok(text)
}
