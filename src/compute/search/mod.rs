//! Build-space search: candidate generation, fitness ranking and the
//! search loop.
//!
//! # Overview
//!
//! - **Plan** (`plan`): resolves options against the catalog and metric graph
//! - **Candidates** (`candidates`): level-pool permutations, item
//!   combinations and modifier page expansion
//! - **Fitness** (`fitness`): baseline-relative scoring with level weights
//! - **Archive** (`archive`): labelled records and the bounded best-K list
//! - **Engine** (`engine`): multiplexes abilities, equipment, modifier pages
//!   and stack counts over the requested levels
//!
//! # Example
//!
//! ```rust,no_run
//! use build_forge::compute::search::BuildSearch;
//! use build_forge::schema::{Catalog, SearchOptions};
//!
//! let catalog = Catalog::builtin();
//! let mut options = SearchOptions::new("Cramorant");
//! options.sort = vec!["dps".to_string()];
//!
//! let result = BuildSearch::standard(&catalog)
//!     .run_with_callback(&options, |progress| {
//!         println!("{} candidates evaluated", progress.candidates_evaluated);
//!     })
//!     .unwrap();
//! println!("Best: {}", result.records.last().unwrap().label);
//! ```

mod archive;
mod candidates;
mod engine;
mod fitness;
mod plan;

pub use archive::{FitnessRecord, RecordLabel, Retention, TOP_K_LIMIT, TopKList};
pub use candidates::{
    MAX_POOL, PageConstraints, expand_modifier_sets, fixed_equipment, item_combinations,
    item_level_candidates, level_permutations,
};
pub use engine::{BuildSearch, SearchProgress, SearchResult, SearchStats, run_search};
pub use fitness::{FitnessRanker, LevelWeights, PRIORITY_FACTOR, deviation};
pub use plan::{DEFAULT_SHOW, MAX_STACKS, SearchPlan};
