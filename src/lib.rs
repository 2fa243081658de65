//! Build Forge - Search and scoring of character builds.
//!
//! This crate explores the configurations a character can be built with
//! (held items and their levels, modifier pages, ability picks and stack
//! counts) and ranks them by metrics derived from the resulting stats.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Catalog records, stat vectors, search options and errors
//! - `compute`: Build evaluation, the metric graph and the search engine
//!
//! # Example
//!
//! ```rust,no_run
//! use build_forge::{
//!     compute::search::run_search,
//!     schema::{Catalog, ItemChoice, SearchOptions},
//! };
//!
//! let catalog = Catalog::builtin();
//!
//! let mut options = SearchOptions::new("Absol");
//! options.items = vec![ItemChoice::leveled("ScopeLens", 30)];
//! options.show = vec!["dps".to_string(), "ehp".to_string()];
//!
//! let result = run_search(&catalog, &options).unwrap();
//! for record in &result.records {
//!     println!("{}", record.label);
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::search::{BuildSearch, SearchResult, run_search};
pub use compute::{MetricGraph, StatEvaluator};
pub use schema::{Catalog, SearchError, SearchOptions};
