//! Error types for search planning and evaluation.

use std::fmt;

/// Broad classification of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied a bad name, value or option.
    Validation,
    /// The options are individually valid but do not fit together.
    Structural,
    /// An invariant of the engine itself was violated.
    Internal,
}

/// The kind of name that failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Character,
    Item,
    Modifier,
    Family,
    Ability,
    Metric,
    Stat,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NameKind::Character => "character",
            NameKind::Item => "item",
            NameKind::Modifier => "modifier",
            NameKind::Family => "modifier family",
            NameKind::Ability => "ability",
            NameKind::Metric => "metric",
            NameKind::Stat => "stat",
        };
        f.write_str(name)
    }
}

/// Any failure that aborts a search.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("Unknown {kind}: {name}")]
    UnknownName { kind: NameKind, name: String },
    #[error("{what} out of range: {value} (should be {min}-{max})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("Too many {what} specified: {count} (at most {max})")]
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },
    #[error("Invalid {option}: {reason}")]
    InvalidOption { option: &'static str, reason: String },
    #[error("Modifier page holds {count} picks instead of {expected}")]
    ModifierSetSize { count: usize, expected: usize },
    #[error("Too few items without levels to optimize: {0} (need at least 2)")]
    TooFewFreeItems(usize),
    #[error(
        "Mismatch in the number of items without a level ({items}) and the number of search levels ({pool})"
    )]
    PoolMismatch { items: usize, pool: usize },
    #[error("Already searching {current}; cannot search {requested} too")]
    ConflictingSearch {
        current: &'static str,
        requested: &'static str,
    },
    #[error("Metric dependency cycle: {}", .0.join(" -> "))]
    MetricCycle(Vec<String>),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::UnknownName { .. }
            | SearchError::OutOfRange { .. }
            | SearchError::TooMany { .. }
            | SearchError::InvalidOption { .. }
            | SearchError::ModifierSetSize { .. } => ErrorKind::Validation,
            SearchError::TooFewFreeItems(_)
            | SearchError::PoolMismatch { .. }
            | SearchError::ConflictingSearch { .. } => ErrorKind::Structural,
            SearchError::MetricCycle(_) => ErrorKind::Internal,
        }
    }

    /// Range check helper used throughout option validation.
    pub(crate) fn check_range(
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    ) -> Result<(), SearchError> {
        if value < min || value > max {
            return Err(SearchError::OutOfRange {
                what,
                value,
                min,
                max,
            });
        }
        Ok(())
    }
}
