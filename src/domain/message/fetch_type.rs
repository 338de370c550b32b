use serde::Serialize;

/// Represents the projection level of a message read, from the
/// narrowest (`Metadata`) to the widest (`Full`).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum FetchType {
    /// Uid, flags and mod-seq only, no content.
    Metadata,
    /// Metadata plus the header section of the content.
    Headers,
    /// Metadata plus the whole content and the materialized
    /// attachments.
    Body,
    /// Everything.
    Full,
}

impl FetchType {
    /// Returns true when this projection level materializes
    /// attachments by itself. Backends without the partial attachment
    /// fetch optimization materialize attachments on every level
    /// regardless.
    pub fn includes_attachments(&self) -> bool {
        matches!(self, Self::Body | Self::Full)
    }
}
