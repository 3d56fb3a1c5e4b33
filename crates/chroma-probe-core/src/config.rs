//! Centralized configuration for chroma-probe.
//!
//! Names, limits and markers that describe the on-disk layout of a Chroma
//! database directory and the shape of the artifacts the tools produce.

/// Layout of the embedded storage file.
pub struct StorageConfig;

impl StorageConfig {
    /// Storage file names tried in order before falling back to a scan.
    pub const CANDIDATE_FILE_NAMES: &'static [&'static str] =
        &["chroma.sqlite3", "chroma.db", "database.db"];
    /// Extension accepted by the fallback scan.
    pub const FALLBACK_EXTENSION: &'static str = "sqlite3";
    /// Suffixes that mark a directory entry as a possible SQLite file.
    pub const POTENTIAL_SUFFIXES: &'static [&'static str] = &[".sqlite", ".sqlite3", ".db"];
    /// Substring (lowercase) that marks a directory entry as a possible SQLite file.
    pub const POTENTIAL_NAME_MARKER: &'static str = "chroma";

    pub const COLLECTIONS_TABLE: &'static str = "collections";
    pub const ID_COLUMN: &'static str = "id";
    pub const NAME_COLUMN: &'static str = "name";
    pub const CONFIGURATION_COLUMN: &'static str = "configuration_json_str";

    /// Rows sampled by the schema inspector.
    pub const SAMPLE_ROW_LIMIT: usize = 5;
}

/// Configuration repair constants.
pub struct RepairConfig;

impl RepairConfig {
    pub const DISCRIMINATOR_KEY: &'static str = "_type";
    /// Variant every repaired configuration is tagged with.
    pub const INTERNAL_VARIANT: &'static str = "CollectionConfigurationInternal";
    pub const HNSW_KEY: &'static str = "hnsw";
    pub const SPANN_KEY: &'static str = "spann";
    pub const EMBEDDING_FUNCTION_KEY: &'static str = "embedding_function";
}

/// Migration artifact constants.
pub struct MigrationConfig;

impl MigrationConfig {
    /// File name of the generated script, written next to the database directory.
    pub const SCRIPT_FILE_NAME: &'static str = "chroma_migration.sql";
    /// Suffix appended to the database directory name for the backup copy.
    pub const BACKUP_SUFFIX: &'static str = "_backup";
}

/// Client version advisory thresholds.
pub struct VersionConfig;

impl VersionConfig {
    /// First release line known to mishandle `_type`.
    pub const BROKEN_MINOR: (u64, u64) = (0, 6);
    /// First release that reads legacy configurations correctly.
    pub const FIXED_RELEASE: &'static str = "1.0.7";
    /// Last known-good release before the fix line.
    pub const STABLE_FALLBACK: &'static str = "1.0.0";
}
