pub mod flag;
pub mod flags;

pub use flag::Flag;
pub use flags::Flags;
