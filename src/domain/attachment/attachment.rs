use serde::Serialize;

/// Represents the opaque identifier of one attachment payload.
///
/// The id is a caller-supplied token; the store trusts that two
/// different payloads are never submitted under the same id. Whether
/// the token is a content digest is the caller's business.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttachmentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for AttachmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Represents an immutable stored binary payload with its declared
/// content type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Attachment {
    pub fn new<I, T>(id: I, bytes: Vec<u8>, content_type: T) -> Self
    where
        I: Into<AttachmentId>,
        T: ToString,
    {
        Self {
            id: id.into(),
            bytes,
            content_type: content_type.to_string(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
