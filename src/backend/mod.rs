mod backend;
mod config;

#[cfg(feature = "memory-backend")]
pub mod memory;
#[cfg(feature = "sqlite-backend")]
pub mod sqlite;

pub use self::backend::{
    AttachmentStore, BackendBuilder, BackendCapabilities, Capability, Error, MessageStore, Result,
};
pub use self::config::BackendConfig;
#[cfg(feature = "memory-backend")]
pub use self::memory::MemoryBackend;
#[cfg(feature = "sqlite-backend")]
pub use self::sqlite::{SqliteBackend, SqliteConfig};
