use chrono::{DateTime, Local};

use crate::{Flags, MessageAttachment, MessageAttachmentPointer};

/// Represents a message uid, unique and ascending within one mailbox.
pub type Uid = u32;

/// Represents a stored mailbox message together with its attachment
/// pointer set.
///
/// `uid` and `mod_seq` are assigned by the message store: `uid` is
/// written back on `add_message`, the observed mod-seq is re-read via
/// `highest_mod_seq`. `attachments` is populated on read only, when
/// the fetch type (or the backend's declared capabilities) calls for
/// materialization.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MailboxMessage {
    pub uid: Uid,
    pub internal_date: DateTime<Local>,
    pub flags: Flags,
    pub mod_seq: u64,
    /// Offset of the first body byte within `content`.
    pub body_start: usize,
    pub content: Vec<u8>,
    pub attachment_pointers: Vec<MessageAttachmentPointer>,
    pub attachments: Vec<MessageAttachment>,
}

impl MailboxMessage {
    pub fn new(
        internal_date: DateTime<Local>,
        content: Vec<u8>,
        body_start: usize,
        flags: Flags,
        attachment_pointers: Vec<MessageAttachmentPointer>,
    ) -> Self {
        Self {
            uid: 0,
            internal_date,
            flags,
            mod_seq: 0,
            body_start,
            content,
            attachment_pointers,
            attachments: Vec::new(),
        }
    }

    /// Returns the header section of the content.
    pub fn headers(&self) -> &[u8] {
        &self.content[..self.body_start.min(self.content.len())]
    }

    /// Returns the body section of the content.
    pub fn body(&self) -> &[u8] {
        &self.content[self.body_start.min(self.content.len())..]
    }
}
