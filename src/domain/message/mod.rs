//! Message module.
//!
//! This module contains everything related to mailbox messages: the
//! stored message, the fetch projection levels and uid ranges.

mod fetch_type;
pub use fetch_type::*;

mod message;
pub use message::*;

mod range;
pub use range::*;
