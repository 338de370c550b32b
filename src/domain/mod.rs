pub mod attachment;
pub use attachment::*;

pub mod flag;
pub use flag::{Flag, Flags};

pub mod mailbox;
pub use mailbox::*;

pub mod message;
pub use message::*;
