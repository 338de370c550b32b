use std::path::PathBuf;

/// Represents the SQLite backend configuration.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct SqliteConfig {
    /// Path of the database file, created on first open.
    pub db_path: PathBuf,
}
