//! Backend config module.
//!
//! This module contains the representation of the backend
//! configuration used to select a storage engine.

#[cfg(feature = "sqlite-backend")]
use crate::SqliteConfig;

/// Represents the backend configuration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BackendConfig {
    None,
    #[cfg(feature = "memory-backend")]
    Memory,
    #[cfg(feature = "sqlite-backend")]
    Sqlite(SqliteConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::None
    }
}
