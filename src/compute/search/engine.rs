//! The search loop: ability picks, equipment, modifier pages and stack
//! counts multiplexed over the requested levels.

use std::time::Instant;

use serde::Serialize;

use crate::schema::{CatalogProvider, SearchError, SearchOptions};

use crate::compute::build::{
    AbilitySelection, BuildEvaluator, BuildSpec, EQUIPMENT_SLOTS, Equipment, EquipmentSlot,
    ModifierSet, StatEvaluator, equipment_capabilities,
};
use crate::compute::metrics::{LevelRecord, MetricGraph};

use super::archive::{FitnessRecord, RecordLabel, Retention, TopKList};
use super::plan::SearchPlan;

/// Progress reported after every candidate.
#[derive(Debug, Clone, Serialize)]
pub struct SearchProgress {
    /// Candidates evaluated so far, counting each stack count separately.
    pub candidates_evaluated: usize,
    /// Ability, equipment and modifier combinations, before stack counts.
    pub combinations_total: usize,
    /// Builds materialized so far, including baselines.
    pub builds_evaluated: usize,
    /// Records currently retained.
    pub retained: usize,
    /// Lowest retained fitness when ranking.
    pub min_fitness: Option<f64>,
}

/// Statistics from a search run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchStats {
    pub candidates: usize,
    pub builds: usize,
    pub retained: usize,
    pub ranked: bool,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
}

/// Records produced by a search, ascending by fitness when ranked.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub records: Vec<FitnessRecord>,
    pub stats: SearchStats,
}

/// Runs searches against one catalog with one evaluator and metric graph.
pub struct BuildSearch<'c, E> {
    catalog: &'c dyn CatalogProvider,
    evaluator: E,
    metrics: MetricGraph,
}

impl<'c> BuildSearch<'c, StatEvaluator> {
    /// Search with the stat evaluator and the standard metrics.
    pub fn standard(catalog: &'c dyn CatalogProvider) -> Self {
        Self::new(catalog, StatEvaluator, MetricGraph::standard())
    }
}

impl<'c, E: BuildEvaluator> BuildSearch<'c, E> {
    pub fn new(catalog: &'c dyn CatalogProvider, evaluator: E, metrics: MetricGraph) -> Self {
        Self {
            catalog,
            evaluator,
            metrics,
        }
    }

    pub fn metrics(&self) -> &MetricGraph {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MetricGraph {
        &mut self.metrics
    }

    pub fn run(&self, options: &SearchOptions) -> Result<SearchResult, SearchError> {
        self.run_with_callback(options, |_| {})
    }

    /// Run a search, reporting progress after every candidate.
    pub fn run_with_callback<F>(
        &self,
        options: &SearchOptions,
        mut callback: F,
    ) -> Result<SearchResult, SearchError>
    where
        F: FnMut(&SearchProgress),
    {
        let start = Instant::now();
        let plan = SearchPlan::resolve(options, self.catalog, &self.metrics)?;
        let ranker = plan.ranker();

        log::info!(
            "Searching {} over {} combinations at {} levels{}",
            plan.character.name,
            plan.candidate_count(),
            plan.levels.len(),
            if ranker.is_some() { ", ranked" } else { "" }
        );

        let mut retention = if ranker.is_some() {
            Retention::Ranked(TopKList::new())
        } else {
            Retention::Unranked(Vec::new())
        };
        let mut progress = SearchProgress {
            candidates_evaluated: 0,
            combinations_total: plan.candidate_count(),
            builds_evaluated: 0,
            retained: 0,
            min_fitness: None,
        };

        let no_modifiers = ModifierSet::empty();
        let no_equipment = [EquipmentSlot::EMPTY; EQUIPMENT_SLOTS];

        for &abilities in &plan.abilities {
            let baseline = match &ranker {
                Some(_) => {
                    progress.builds_evaluated += plan.levels.len();
                    Some(self.evaluate_levels(&plan, &no_equipment, &no_modifiers, abilities, 0)?)
                }
                None => None,
            };

            for equipment in &plan.equipment {
                for modifiers in &plan.modifier_sets {
                    let capabilities = plan.character.capabilities()
                        | equipment_capabilities(equipment)
                        | modifiers.capabilities();

                    for stacks in plan.stack_counts(capabilities.stacks) {
                        let levels =
                            self.evaluate_levels(&plan, equipment, modifiers, abilities, stacks)?;
                        let label = RecordLabel {
                            character: plan.character.name.clone(),
                            equipment: equipment.iter().map(ToString::to_string).collect(),
                            modifiers: modifiers.to_string(),
                            abilities: abilities.label(plan.character),
                            stacks,
                        };
                        let fitness = ranker
                            .as_ref()
                            .zip(baseline.as_ref())
                            .map(|(ranker, baseline)| ranker.score(&levels, baseline));

                        log::trace!("{} -> {:?}", label, fitness);
                        retention.keep(FitnessRecord::new(label, levels), fitness);

                        progress.candidates_evaluated += 1;
                        progress.builds_evaluated += plan.levels.len();
                        progress.retained = retention.len();
                        if let Retention::Ranked(list) = &retention {
                            progress.min_fitness = list.min_fitness();
                        }
                        callback(&progress);
                    }
                }
            }
        }

        let stats = SearchStats {
            candidates: progress.candidates_evaluated,
            builds: progress.builds_evaluated,
            retained: retention.len(),
            ranked: ranker.is_some(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
        };
        log::info!(
            "Search finished: {} candidates, {} builds, {} records in {:.2}s",
            stats.candidates,
            stats.builds,
            stats.retained,
            stats.elapsed_seconds
        );

        Ok(SearchResult {
            records: retention.into_vec(),
            stats,
        })
    }

    /// One record per requested level with every planned metric filled in.
    fn evaluate_levels(
        &self,
        plan: &SearchPlan<'_>,
        equipment: &Equipment<'_>,
        modifiers: &ModifierSet<'_>,
        abilities: AbilitySelection,
        stacks: u32,
    ) -> Result<Vec<LevelRecord>, SearchError> {
        plan.levels
            .iter()
            .map(|&level| {
                let spec = BuildSpec {
                    character: plan.character,
                    level,
                    equipment: *equipment,
                    abilities,
                    stacks,
                    modifiers,
                };
                let build = self.evaluator.build(&spec)?;

                let mut record = LevelRecord::new(level);
                for metric in &plan.metrics {
                    self.metrics.evaluate(
                        &mut record,
                        &build,
                        plan.enemy.as_ref(),
                        &plan.params,
                        metric,
                    )?;
                }
                Ok(record)
            })
            .collect()
    }
}

/// Run a search with the stat evaluator and the standard metrics.
pub fn run_search(
    catalog: &dyn CatalogProvider,
    options: &SearchOptions,
) -> Result<SearchResult, SearchError> {
    BuildSearch::standard(catalog).run(options)
}
