//! Backend module.
//!
//! This module exposes the storage contracts every backend must
//! satisfy: the attachment store, the mailbox message store and the
//! capability declaration used to negotiate optional optimizations.

use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    result,
};
use thiserror::Error;

use crate::{
    backend, Attachment, AttachmentId, BackendConfig, FetchType, Mailbox, MailboxMessage, UidRange,
};

#[cfg(feature = "memory-backend")]
use crate::MemoryBackend;

#[cfg(feature = "sqlite-backend")]
use crate::SqliteBackend;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build backend with an empty config")]
    BuildBackendError,

    #[cfg(feature = "memory-backend")]
    #[error(transparent)]
    MemoryBackendError(#[from] backend::memory::Error),
    #[cfg(feature = "sqlite-backend")]
    #[error(transparent)]
    SqliteBackendError(#[from] backend::sqlite::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents an optional feature a backend may decline to support.
///
/// Backends declare the capabilities they do *not* implement; callers
/// and the conformance suite adapt to the declaration instead of
/// probing at runtime.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum Capability {
    /// Persisting mailbox messages.
    MessageStorage,
    /// Persisting attachment payloads.
    AttachmentStorage,
    /// Omitting attachments from `Headers`/`Metadata` reads. A backend
    /// without this optimization materializes attachments on every
    /// fetch type.
    PartialAttachmentFetch,
}

pub trait BackendCapabilities {
    /// Returns the set of capabilities this backend does not
    /// implement.
    fn unsupported_capabilities(&self) -> HashSet<Capability>;

    fn supports(&self, capability: Capability) -> bool {
        !self.unsupported_capabilities().contains(&capability)
    }
}

/// Represents the content-addressed attachment store.
pub trait AttachmentStore: BackendCapabilities {
    /// Persists one attachment keyed by its id. Storing under an id
    /// already present overwrites the previous payload.
    fn store_attachment(&self, attachment: &Attachment) -> Result<()>;

    /// Returns the subset of the requested ids that exist in the
    /// store, in unspecified order. Absent ids shrink the result, they
    /// never fail the call.
    fn get_attachments(&self, ids: &HashSet<AttachmentId>) -> Result<Vec<Attachment>>;

    /// Returns the requested attachments keyed by id. Ids with no
    /// match are absent keys.
    fn attachments_by_id(
        &self,
        ids: &HashSet<AttachmentId>,
    ) -> Result<HashMap<AttachmentId, Attachment>> {
        Ok(self
            .get_attachments(ids)?
            .into_iter()
            .map(|attachment| (attachment.id.clone(), attachment))
            .collect())
    }
}

/// Represents the mailbox message store.
pub trait MessageStore: BackendCapabilities {
    /// Persists the message and its attachment pointers under the
    /// mailbox. Assigns the next per-mailbox uid to `message` and
    /// bumps the mailbox mod-seq; the observed mod-seq is re-read via
    /// [`MessageStore::highest_mod_seq`].
    fn add_message(&self, mailbox: &Mailbox, message: &mut MailboxMessage) -> Result<()>;

    /// Returns the mailbox's monotonically increasing mod-seq
    /// counter. A mailbox that has never been mutated reports 0.
    fn highest_mod_seq(&self, mailbox: &Mailbox) -> Result<u64>;

    /// Returns at most `limit` messages whose uid falls in `range`,
    /// ordered by ascending uid. Attachments are materialized
    /// according to `fetch_type` and the backend's declared
    /// capabilities.
    fn find_in_mailbox(
        &self,
        mailbox: &Mailbox,
        range: UidRange,
        fetch_type: FetchType,
        limit: usize,
    ) -> Result<Vec<MailboxMessage>>;
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct BackendBuilder;

impl BackendBuilder {
    pub fn build_attachment_store(
        backend_config: &BackendConfig,
    ) -> Result<Box<dyn AttachmentStore>> {
        match backend_config {
            #[cfg(feature = "memory-backend")]
            BackendConfig::Memory => Ok(Box::new(MemoryBackend::new())),
            #[cfg(feature = "sqlite-backend")]
            BackendConfig::Sqlite(sqlite_config) => {
                Ok(Box::new(SqliteBackend::new(sqlite_config)?))
            }
            BackendConfig::None => Err(Error::BuildBackendError),
        }
    }

    pub fn build_message_store(backend_config: &BackendConfig) -> Result<Box<dyn MessageStore>> {
        match backend_config {
            #[cfg(feature = "memory-backend")]
            BackendConfig::Memory => Ok(Box::new(MemoryBackend::new())),
            #[cfg(feature = "sqlite-backend")]
            BackendConfig::Sqlite(sqlite_config) => {
                Ok(Box::new(SqliteBackend::new(sqlite_config)?))
            }
            BackendConfig::None => Err(Error::BuildBackendError),
        }
    }
}
