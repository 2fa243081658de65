//! Search results: labelled records and the bounded best-K list.

use std::fmt;

use serde::Serialize;

use crate::compute::metrics::LevelRecord;

/// Most records a ranked search keeps.
pub const TOP_K_LIMIT: usize = 100;

/// What a record describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordLabel {
    pub character: String,
    /// One entry per slot, `Item@level` or `-`.
    pub equipment: Vec<String>,
    pub modifiers: String,
    pub abilities: String,
    pub stacks: u32,
}

impl fmt::Display for RecordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} {} stacks={}",
            self.character,
            self.equipment.join(", "),
            self.modifiers,
            self.abilities,
            self.stacks
        )
    }
}

/// One candidate's per-level metrics, with its fitness once ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitnessRecord {
    pub label: RecordLabel,
    pub levels: Vec<LevelRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness: Option<f64>,
}

impl FitnessRecord {
    pub fn new(label: RecordLabel, levels: Vec<LevelRecord>) -> Self {
        Self {
            label,
            levels,
            fitness: None,
        }
    }
}

/// Records in ascending fitness order, capped at a limit.
#[derive(Debug, Clone)]
pub struct TopKList {
    entries: Vec<FitnessRecord>,
    limit: usize,
}

impl Default for TopKList {
    fn default() -> Self {
        Self::new()
    }
}

impl TopKList {
    pub fn new() -> Self {
        Self::with_limit(TOP_K_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::with_capacity(limit + 1),
            limit,
        }
    }

    /// Insert before the first entry that is not lower, then drop the lowest
    /// entry if over the limit.
    pub fn insert(&mut self, mut record: FitnessRecord, fitness: f64) {
        record.fitness = Some(fitness);
        let position = self
            .entries
            .iter()
            .position(|e| e.fitness.is_some_and(|f| f >= fitness))
            .unwrap_or(self.entries.len());
        self.entries.insert(position, record);
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lowest kept fitness.
    pub fn min_fitness(&self) -> Option<f64> {
        self.entries.first().and_then(|e| e.fitness)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FitnessRecord> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<FitnessRecord> {
        self.entries
    }
}

/// Where a search puts its records.
#[derive(Debug, Clone)]
pub enum Retention {
    /// Bounded, ascending by fitness.
    Ranked(TopKList),
    /// Everything, in evaluation order.
    Unranked(Vec<FitnessRecord>),
}

impl Retention {
    pub fn keep(&mut self, record: FitnessRecord, fitness: Option<f64>) {
        match (self, fitness) {
            (Retention::Ranked(list), Some(fitness)) => list.insert(record, fitness),
            (Retention::Ranked(_), None) => {
                log::warn!("Dropping unscored record {}", record.label);
            }
            (Retention::Unranked(records), _) => records.push(record),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Retention::Ranked(list) => list.len(),
            Retention::Unranked(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<FitnessRecord> {
        match self {
            Retention::Ranked(list) => list.into_vec(),
            Retention::Unranked(records) => records,
        }
    }
}
