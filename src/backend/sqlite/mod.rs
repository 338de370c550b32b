mod backend;
mod config;

pub use backend::*;
pub use config::SqliteConfig;
