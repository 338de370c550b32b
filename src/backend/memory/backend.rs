//! Memory backend module.
//!
//! This module contains the definition of the in-memory backend and
//! its storage traits implementation. The backend keeps everything
//! behind mutexes so independent callers can share one instance.

use log::{debug, trace};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    result,
    sync::{Mutex, MutexGuard},
};
use thiserror::Error;

use crate::{
    backend, Attachment, AttachmentId, AttachmentResolver, AttachmentStore, BackendCapabilities,
    Capability, FetchType, Mailbox, MailboxId, MailboxMessage, MessageStore, Uid, UidRange,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot lock memory store: {0}")]
    LockPoisonedError(String),
}

pub type Result<T> = result::Result<T, Error>;

/// Per-mailbox state: the counters owned by the mailbox record and
/// its messages keyed by uid, kept ordered for range scans.
#[derive(Debug, Default)]
struct MailboxEntry {
    highest_mod_seq: u64,
    last_uid: Uid,
    messages: BTreeMap<Uid, MailboxMessage>,
}

/// Represents the in-memory backend. Supports every capability,
/// including the partial attachment fetch optimization.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    attachments: Mutex<HashMap<AttachmentId, Attachment>>,
    mailboxes: Mutex<HashMap<MailboxId, MailboxEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>> {
        mutex
            .lock()
            .map_err(|err| Error::LockPoisonedError(err.to_string()))
    }

    /// Applies the fetch type projection to a stored message,
    /// materializing attachments when the projection (or the missing
    /// partial fetch optimization) calls for it.
    fn project(
        &self,
        message: &MailboxMessage,
        fetch_type: FetchType,
    ) -> backend::Result<MailboxMessage> {
        let mut projected = message.clone();

        match fetch_type {
            FetchType::Metadata => projected.content = Vec::new(),
            FetchType::Headers => projected.content = message.headers().to_vec(),
            FetchType::Body | FetchType::Full => (),
        }

        if fetch_type.includes_attachments() || !self.supports(Capability::PartialAttachmentFetch)
        {
            projected.attachments =
                AttachmentResolver::new(self).resolve(&message.attachment_pointers)?;
        }

        Ok(projected)
    }
}

impl BackendCapabilities for MemoryBackend {
    fn unsupported_capabilities(&self) -> HashSet<Capability> {
        HashSet::default()
    }
}

impl AttachmentStore for MemoryBackend {
    fn store_attachment(&self, attachment: &Attachment) -> backend::Result<()> {
        debug!("store attachment: {:?}", attachment.id);

        Self::lock(&self.attachments)?.insert(attachment.id.clone(), attachment.clone());
        Ok(())
    }

    fn get_attachments(&self, ids: &HashSet<AttachmentId>) -> backend::Result<Vec<Attachment>> {
        debug!("get attachments: {:?} ids", ids.len());

        let attachments = Self::lock(&self.attachments)?;
        Ok(ids
            .iter()
            .filter_map(|id| attachments.get(id).cloned())
            .collect())
    }
}

impl MessageStore for MemoryBackend {
    fn add_message(&self, mailbox: &Mailbox, message: &mut MailboxMessage) -> backend::Result<()> {
        debug!("add message to mailbox: {:?}", mailbox.id);

        let mut mailboxes = Self::lock(&self.mailboxes)?;
        let entry = mailboxes.entry(mailbox.id.clone()).or_default();

        entry.last_uid += 1;
        entry.highest_mod_seq += 1;
        message.uid = entry.last_uid;
        trace!("assigned uid: {:?}", message.uid);

        let mut stored = message.clone();
        stored.mod_seq = entry.highest_mod_seq;
        stored.attachments = Vec::new();
        entry.messages.insert(stored.uid, stored);

        Ok(())
    }

    fn highest_mod_seq(&self, mailbox: &Mailbox) -> backend::Result<u64> {
        let mailboxes = Self::lock(&self.mailboxes)?;
        Ok(mailboxes
            .get(&mailbox.id)
            .map(|entry| entry.highest_mod_seq)
            .unwrap_or_default())
    }

    fn find_in_mailbox(
        &self,
        mailbox: &Mailbox,
        range: UidRange,
        fetch_type: FetchType,
        limit: usize,
    ) -> backend::Result<Vec<MailboxMessage>> {
        debug!("find in mailbox: {:?}", mailbox.id);
        debug!("range: {:?}, fetch type: {:?}, limit: {:?}", range, fetch_type, limit);

        let mailboxes = Self::lock(&self.mailboxes)?;
        let selected: Vec<MailboxMessage> = match mailboxes.get(&mailbox.id) {
            None => Vec::new(),
            Some(entry) => entry
                .messages
                .values()
                .filter(|message| range.contains(message.uid))
                .take(limit)
                .cloned()
                .collect(),
        };
        drop(mailboxes);

        selected
            .iter()
            .map(|message| self.project(message, fetch_type))
            .collect()
    }
}
