pub mod backend;
pub use backend::*;

pub mod conformance;

pub mod domain;
pub use domain::*;
