//! Attachment module.
//!
//! This module contains everything related to attachments: the
//! content-addressed payload, the per-message pointers and the
//! resolver joining the two.

mod attachment;
pub use attachment::*;

mod message_attachment;
pub use message_attachment::*;

mod resolver;
pub use resolver::*;
