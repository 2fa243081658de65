//! Compute module - Build evaluation, metrics and search.

mod build;
mod metrics;

pub mod search;

pub use build::*;
pub use metrics::*;
