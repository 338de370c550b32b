//! Mailbox module.
//!
//! This module contains everything related to mailboxes, the named
//! message containers.

mod mailbox;
pub use mailbox::*;
