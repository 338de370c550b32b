use serde::Serialize;

use crate::{Attachment, AttachmentId};

/// Represents a content-id, the token a message body uses to
/// reference an attachment inline (embedded images for instance).
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct Cid(String);

impl Cid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cid {
    fn from(cid: &str) -> Self {
        Self(cid.to_owned())
    }
}

impl From<String> for Cid {
    fn from(cid: String) -> Self {
        Self(cid)
    }
}

/// Represents a message-scoped reference to an attachment: the target
/// id plus the display metadata local to the referencing message.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MessageAttachmentPointer {
    pub attachment_id: AttachmentId,
    pub name: Option<String>,
    pub cid: Option<Cid>,
    pub is_inline: bool,
}

impl MessageAttachmentPointer {
    pub fn new<I>(attachment_id: I, name: Option<String>, cid: Option<Cid>, is_inline: bool) -> Self
    where
        I: Into<AttachmentId>,
    {
        Self {
            attachment_id: attachment_id.into(),
            name,
            cid,
            is_inline,
        }
    }
}

/// Represents the read-ready join of a stored attachment with the
/// metadata of the pointer that referenced it. Never persisted, always
/// derived by the resolver.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageAttachment {
    pub attachment: Attachment,
    pub name: Option<String>,
    pub cid: Option<Cid>,
    pub is_inline: bool,
}

impl MessageAttachment {
    pub fn new(
        attachment: Attachment,
        name: Option<String>,
        cid: Option<Cid>,
        is_inline: bool,
    ) -> Self {
        Self {
            attachment,
            name,
            cid,
            is_inline,
        }
    }
}
