//! Schema module - Catalog records, stat vectors, search options and errors.

mod builtin;
mod catalog;
mod error;
mod options;
mod stats;

pub use catalog::*;
pub use error::*;
pub use options::*;
pub use stats::*;
