//! Resolution of search options against the catalog and metric graph.
//!
//! Every name, range and combination is checked here, and the equipment
//! and modifier candidates are enumerated, before a single build is made.

use std::ops::RangeInclusive;

use crate::schema::{
    AbilityRef, CatalogProvider, CharacterRecord, CritMode, EmblemOptions, EmblemPick,
    EquipmentSearch, ITEM_MAX_LEVEL, ItemChoice, ItemRecord, LevelWeighting, ModifierRecord,
    NameKind, SearchError, SearchOptions, Target, WeightProfile,
};

use crate::compute::build::{
    AbilitySelection, EQUIPMENT_SLOTS, Equipment, EquipmentSlot, ModifierSet,
};
use crate::compute::metrics::{EvalParams, MetricGraph};

use super::candidates::{
    PageConstraints, expand_modifier_sets, fixed_equipment, item_combinations,
    item_level_candidates,
};
use super::fitness::{FitnessRanker, LevelWeights};

/// Highest stack count searched.
pub const MAX_STACKS: u32 = 6;

/// Metrics shown when the options name none.
pub const DEFAULT_SHOW: [&str; 2] = ["stats", "autos"];

/// Fully resolved search.
#[derive(Debug, Clone)]
pub struct SearchPlan<'c> {
    pub character: &'c CharacterRecord,
    pub levels: Vec<u8>,
    pub equipment: Vec<Equipment<'c>>,
    pub modifier_sets: Vec<ModifierSet<'c>>,
    pub abilities: Vec<AbilitySelection>,
    /// Stack range used when a candidate can stack.
    pub stacks: RangeInclusive<u32>,
    /// Every metric to record: the shown metrics, then any extra sort keys.
    pub metrics: Vec<String>,
    pub sort_keys: Vec<String>,
    pub weights: LevelWeights,
    pub params: EvalParams,
    pub enemy: Option<Target>,
}

impl<'c> SearchPlan<'c> {
    pub fn resolve(
        options: &SearchOptions,
        catalog: &'c dyn CatalogProvider,
        metrics: &MetricGraph,
    ) -> Result<Self, SearchError> {
        let character = catalog.lookup_character(&options.character)?;
        let levels = options.levels.resolve()?;

        SearchError::check_range(
            "Default item level",
            i64::from(options.default_item_level),
            1,
            i64::from(ITEM_MAX_LEVEL),
        )?;

        if options.equipment_search.is_search() && options.emblems.is_search() {
            return Err(SearchError::ConflictingSearch {
                current: options.equipment_search.name(),
                requested: "emblems",
            });
        }

        let equipment = resolve_equipment(options, character, catalog)?;
        let modifier_sets = resolve_modifiers(&options.emblems, catalog)?;
        let abilities = resolve_abilities(options, character)?;
        let stacks = resolve_stacks(options.stacks)?;

        let show: Vec<String> = if options.show.is_empty() {
            DEFAULT_SHOW.iter().map(|s| s.to_string()).collect()
        } else {
            options.show.clone()
        };
        let mut shown = metrics.expand(&show)?;
        let sort_keys = metrics.expand(&options.sort)?;
        for key in &sort_keys {
            if !shown.contains(key) {
                shown.push(key.clone());
            }
        }

        let weighting = options
            .weights
            .clone()
            .unwrap_or(LevelWeighting::Profile(WeightProfile::for_role(character.role)));
        let weights = LevelWeights::new(&levels, &weighting)?;

        log::debug!(
            "Planned {}: {} levels, {} equipment, {} modifier pages, {} ability picks",
            character.name,
            levels.len(),
            equipment.len(),
            modifier_sets.len(),
            abilities.len()
        );

        Ok(Self {
            character,
            levels,
            equipment,
            modifier_sets,
            abilities,
            stacks,
            metrics: shown,
            sort_keys,
            weights,
            params: EvalParams { crit: options.crit },
            enemy: options.enemy,
        })
    }

    pub fn is_ranked(&self) -> bool {
        !self.sort_keys.is_empty()
    }

    pub fn ranker(&self) -> Option<FitnessRanker> {
        self.is_ranked()
            .then(|| FitnessRanker::new(self.sort_keys.clone(), self.weights.clone()))
    }

    /// Stack counts to try for a candidate with these capabilities.
    pub fn stack_counts(&self, can_stack: bool) -> RangeInclusive<u32> {
        if can_stack { self.stacks.clone() } else { 0..=0 }
    }

    /// Candidates per ability selection, before stack multiplexing.
    pub fn candidate_count(&self) -> usize {
        self.abilities.len() * self.equipment.len() * self.modifier_sets.len()
    }

    pub fn crit(&self) -> CritMode {
        self.params.crit
    }
}

fn check_item_level(level: u8) -> Result<(), SearchError> {
    SearchError::check_range("Item level", i64::from(level), 1, i64::from(ITEM_MAX_LEVEL))
}

fn resolve_items<'c>(
    choices: &[ItemChoice],
    catalog: &'c dyn CatalogProvider,
) -> Result<Vec<(&'c ItemRecord, Option<u8>)>, SearchError> {
    if choices.len() > EQUIPMENT_SLOTS {
        return Err(SearchError::TooMany {
            what: "items",
            count: choices.len(),
            max: EQUIPMENT_SLOTS,
        });
    }

    let mut items: Vec<(&'c ItemRecord, Option<u8>)> = Vec::with_capacity(choices.len());
    for choice in choices {
        let item = catalog.lookup_item(&choice.name)?;
        if items.iter().any(|(i, _)| i.name == item.name) {
            return Err(SearchError::InvalidOption {
                option: "items",
                reason: format!("{} given more than once", item.name),
            });
        }
        if let Some(level) = choice.level {
            check_item_level(level)?;
        }
        items.push((item, choice.level));
    }
    Ok(items)
}

fn resolve_equipment<'c>(
    options: &SearchOptions,
    character: &CharacterRecord,
    catalog: &'c dyn CatalogProvider,
) -> Result<Vec<Equipment<'c>>, SearchError> {
    let items = resolve_items(&options.items, catalog)?;
    let default_level = options.default_item_level;
    let leveled = |(item, level): &(&'c ItemRecord, Option<u8>)| {
        EquipmentSlot::new(*item, level.unwrap_or(default_level))
    };

    match &options.equipment_search {
        EquipmentSearch::Fixed => {
            let slots: Vec<_> = items.iter().map(leveled).collect();
            Ok(vec![fixed_equipment(&slots)])
        }
        EquipmentSearch::Items => {
            let pinned: Vec<_> = items.iter().map(leveled).collect();
            let pool: Vec<&ItemRecord> = catalog
                .items()
                .iter()
                .filter(|item| item.suits(character.attack_type))
                .filter(|item| !items.iter().any(|(i, _)| i.name == item.name))
                .collect();
            item_combinations(&pinned, &pool, default_level)
        }
        EquipmentSearch::ItemLevels { pool } => {
            let pinned: Vec<_> = items
                .iter()
                .filter(|(_, level)| level.is_some())
                .map(leveled)
                .collect();
            let free: Vec<&ItemRecord> = items
                .iter()
                .filter(|(_, level)| level.is_none())
                .map(|(item, _)| *item)
                .collect();

            let pool = if pool.is_empty() {
                default_pool(free.len(), default_level)
            } else {
                pool.clone()
            };
            for &level in &pool {
                check_item_level(level)?;
            }
            item_level_candidates(&pinned, &free, &pool)
        }
    }
}

/// First free item at the highest level, the rest at the default.
fn default_pool(free: usize, default_level: u8) -> Vec<u8> {
    (0..free)
        .map(|i| if i == 0 { ITEM_MAX_LEVEL } else { default_level })
        .collect()
}

fn lookup_picks<'c>(
    picks: &[EmblemPick],
    catalog: &'c dyn CatalogProvider,
) -> Result<Vec<(&'c ModifierRecord, usize)>, SearchError> {
    picks
        .iter()
        .map(|pick| Ok((catalog.lookup_modifier(&pick.name)?, pick.count)))
        .collect()
}

fn resolve_modifiers<'c>(
    emblems: &EmblemOptions,
    catalog: &'c dyn CatalogProvider,
) -> Result<Vec<ModifierSet<'c>>, SearchError> {
    match emblems {
        EmblemOptions::None => Ok(vec![ModifierSet::empty()]),
        EmblemOptions::Page { picks } => {
            let picks = lookup_picks(picks, catalog)?;
            Ok(vec![ModifierSet::from_picks(picks)?])
        }
        EmblemOptions::Search {
            palette,
            min_family,
            min_stat,
        } => {
            let mut resolved: Vec<(&'c ModifierRecord, usize)> = Vec::new();
            for (modifier, max) in lookup_picks(palette, catalog)? {
                if resolved.iter().any(|(m, _)| m.name == modifier.name) {
                    return Err(SearchError::InvalidOption {
                        option: "emblems",
                        reason: format!("{} appears twice in the palette", modifier.name),
                    });
                }
                resolved.push((modifier, max.min(ModifierSet::CAPACITY)));
            }

            for (family, min) in min_family {
                if !catalog.modifiers().iter().any(|m| m.in_family(family)) {
                    return Err(SearchError::UnknownName {
                        kind: NameKind::Family,
                        name: family.clone(),
                    });
                }
                SearchError::check_range(
                    "Family minimum",
                    *min as i64,
                    0,
                    ModifierSet::CAPACITY as i64,
                )?;
            }

            let constraints = PageConstraints {
                min_family: min_family.iter().map(|(f, m)| (f.clone(), *m)).collect(),
                min_stat: min_stat.iter().map(|(s, v)| (*s, *v)).collect(),
            };
            Ok(expand_modifier_sets(&resolved, &constraints))
        }
    }
}

fn resolve_abilities(
    options: &SearchOptions,
    character: &CharacterRecord,
) -> Result<Vec<AbilitySelection>, SearchError> {
    if options.abilities.len() > character.lines.len() {
        return Err(SearchError::TooMany {
            what: "abilities",
            count: options.abilities.len(),
            max: character.lines.len(),
        });
    }

    let mut fixed: [Option<usize>; 2] = [None, None];

    for ability in &options.abilities {
        if let AbilityRef::Name(name) = ability {
            let (line, index) = character
                .lines
                .iter()
                .enumerate()
                .find_map(|(l, line)| line.position(name).map(|i| (l, i)))
                .ok_or_else(|| SearchError::UnknownName {
                    kind: NameKind::Ability,
                    name: name.clone(),
                })?;
            if fixed[line].is_some() {
                return Err(SearchError::InvalidOption {
                    option: "abilities",
                    reason: format!("more than one ability given for line {}", line + 1),
                });
            }
            fixed[line] = Some(index);
        }
    }

    for ability in &options.abilities {
        if let AbilityRef::Index(index) = ability {
            let Some(line) = fixed.iter().position(Option::is_none) else {
                break;
            };
            let choices = character.lines[line].choices.len();
            SearchError::check_range("Ability", i64::from(*index), 1, choices as i64)?;
            fixed[line] = Some(usize::from(*index) - 1);
        }
    }

    let options_for = |line: usize| -> Vec<usize> {
        match fixed[line] {
            Some(index) => vec![index],
            None if options.all_abilities => (0..character.lines[line].choices.len()).collect(),
            None => vec![0],
        }
    };

    let first = options_for(0);
    let second = options_for(1);
    Ok(first
        .iter()
        .flat_map(|&a| second.iter().map(move |&b| AbilitySelection::new(a, b)))
        .collect())
}

fn resolve_stacks(range: Option<(u32, u32)>) -> Result<RangeInclusive<u32>, SearchError> {
    let Some((min, max)) = range else {
        return Ok(0..=MAX_STACKS);
    };
    SearchError::check_range("Stacks", i64::from(min), 0, i64::from(MAX_STACKS))?;
    SearchError::check_range("Stacks", i64::from(max), 0, i64::from(MAX_STACKS))?;
    if min > max {
        return Err(SearchError::InvalidOption {
            option: "stacks",
            reason: format!("empty range {}-{}", min, max),
        });
    }
    Ok(min..=max)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::schema::{Catalog, ErrorKind, LevelSpec, Stat};

    fn resolve(options: &SearchOptions) -> Result<SearchPlan<'static>, SearchError> {
        let catalog: &'static Catalog = Box::leak(Box::new(Catalog::builtin()));
        SearchPlan::resolve(options, catalog, &MetricGraph::standard())
    }

    #[test]
    fn test_minimal_plan() {
        let plan = resolve(&SearchOptions::new("Cramorant")).unwrap();
        assert_eq!(plan.levels.len(), 15);
        assert_eq!(plan.equipment.len(), 1);
        assert!(plan.equipment[0].iter().all(EquipmentSlot::is_empty));
        assert_eq!(plan.modifier_sets.len(), 1);
        assert_eq!(plan.abilities, vec![AbilitySelection::new(0, 0)]);
        assert!(!plan.is_ranked());
        assert!(plan.metrics.contains(&"health".to_string()));
        assert!(plan.metrics.contains(&"autos".to_string()));
    }

    #[test]
    fn test_unknown_names() {
        let err = resolve(&SearchOptions::new("Pikachu")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown character: Pikachu");

        let mut options = SearchOptions::new("Cramorant");
        options.items = vec![ItemChoice::new("Pebble")];
        assert_eq!(resolve(&options).unwrap_err().kind(), ErrorKind::Validation);

        let mut options = SearchOptions::new("Cramorant");
        options.sort = vec!["speed".to_string()];
        assert!(resolve(&options).is_err());
    }

    #[test]
    fn test_item_checks() {
        let mut options = SearchOptions::new("Cramorant");
        options.items = vec![ItemChoice::leveled("ShellBell", 31)];
        assert!(matches!(
            resolve(&options),
            Err(SearchError::OutOfRange { value: 31, .. })
        ));

        options.items = vec![ItemChoice::new("ShellBell"), ItemChoice::new("ShellBell")];
        assert!(matches!(
            resolve(&options),
            Err(SearchError::InvalidOption { option: "items", .. })
        ));

        options.items = ["A", "B", "C", "D"].map(ItemChoice::new).to_vec();
        assert!(matches!(resolve(&options), Err(SearchError::TooMany { .. })));

        let mut options = SearchOptions::new("Cramorant");
        options.default_item_level = 0;
        assert!(resolve(&options).is_err());
    }

    #[test]
    fn test_item_level_search_default_pool() {
        let mut options = SearchOptions::new("Cramorant");
        options.items = vec![
            ItemChoice::new("ShellBell"),
            ItemChoice::new("WiseGlasses"),
            ItemChoice::new("SpAtkSpecs"),
        ];
        options.equipment_search = EquipmentSearch::ItemLevels { pool: Vec::new() };
        let plan = resolve(&options).unwrap();
        // [30, 20, 20] over three items
        assert_eq!(plan.equipment.len(), 3);
    }

    #[test]
    fn test_item_level_search_errors() {
        let mut options = SearchOptions::new("Cramorant");
        options.items = vec![ItemChoice::new("ShellBell"), ItemChoice::leveled("WiseGlasses", 20)];
        options.equipment_search = EquipmentSearch::ItemLevels { pool: Vec::new() };
        assert_eq!(
            resolve(&options).unwrap_err(),
            SearchError::TooFewFreeItems(1)
        );

        options.items = vec![ItemChoice::new("ShellBell"), ItemChoice::new("WiseGlasses")];
        options.equipment_search = EquipmentSearch::ItemLevels { pool: vec![30] };
        assert_eq!(
            resolve(&options).unwrap_err().kind(),
            ErrorKind::Structural
        );
    }

    #[test]
    fn test_item_search_respects_affinity() {
        let mut options = SearchOptions::new("Absol");
        options.items = vec![ItemChoice::leveled("ScopeLens", 30), ItemChoice::new("RazorClaw")];
        options.equipment_search = EquipmentSearch::Items;
        let plan = resolve(&options).unwrap();
        for equipment in &plan.equipment {
            let item = equipment[2].item.unwrap();
            assert!(item.affinity != Some(crate::schema::AttackType::Special));
            assert_ne!(item.name, "ScopeLens");
        }
        assert!(!plan.equipment.is_empty());
    }

    #[test]
    fn test_conflicting_searches() {
        let mut options = SearchOptions::new("Cramorant");
        options.equipment_search = EquipmentSearch::Items;
        options.emblems = EmblemOptions::Search {
            palette: vec![EmblemPick::new("SparkOrb", 10)],
            min_family: BTreeMap::new(),
            min_stat: BTreeMap::new(),
        };
        assert_eq!(
            resolve(&options).unwrap_err(),
            SearchError::ConflictingSearch {
                current: "items",
                requested: "emblems"
            }
        );
    }

    #[test]
    fn test_emblem_page_and_search() {
        let mut options = SearchOptions::new("Cramorant");
        options.emblems = EmblemOptions::Page {
            picks: vec![EmblemPick::new("SparkOrb", 3)],
        };
        assert!(matches!(
            resolve(&options),
            Err(SearchError::ModifierSetSize { count: 3, .. })
        ));

        options.emblems = EmblemOptions::Search {
            palette: vec![
                EmblemPick::new("SparkOrb", 6),
                EmblemPick::new("LeafBlade", 6),
            ],
            min_family: BTreeMap::from([("yellow".to_string(), 5)]),
            min_stat: BTreeMap::from([(Stat::SpAttack, 0.0)]),
        };
        let plan = resolve(&options).unwrap();
        assert_eq!(plan.modifier_sets.len(), 2);

        options.emblems = EmblemOptions::Search {
            palette: vec![EmblemPick::new("SparkOrb", 10)],
            min_family: BTreeMap::from([("purple".to_string(), 1)]),
            min_stat: BTreeMap::new(),
        };
        assert_eq!(
            resolve(&options).unwrap_err().to_string(),
            "Unknown modifier family: purple"
        );
    }

    #[test]
    fn test_abilities() {
        let mut options = SearchOptions::new("Cramorant");
        options.abilities = vec![AbilityRef::Name("AirSlash".into()), AbilityRef::Index(1)];
        let plan = resolve(&options).unwrap();
        assert_eq!(plan.abilities, vec![AbilitySelection::new(0, 1)]);

        options.abilities = vec![AbilityRef::Index(2)];
        options.all_abilities = true;
        let plan = resolve(&options).unwrap();
        assert_eq!(
            plan.abilities,
            vec![AbilitySelection::new(1, 0), AbilitySelection::new(1, 1)]
        );

        options.abilities = vec![AbilityRef::Index(3)];
        assert!(resolve(&options).is_err());

        options.abilities = vec![
            AbilityRef::Name("Surf".into()),
            AbilityRef::Name("Dive".into()),
        ];
        assert!(resolve(&options).is_err());

        options.abilities = vec![AbilityRef::Name("Splash".into())];
        assert!(resolve(&options).is_err());
    }

    #[test]
    fn test_sort_keys_added_to_metrics() {
        let mut options = SearchOptions::new("Cramorant");
        options.show = vec!["spattack".to_string()];
        options.sort = vec!["dps".to_string(), "ehp".to_string()];
        options.levels = LevelSpec::Text("5-7".to_string());
        let plan = resolve(&options).unwrap();
        assert_eq!(plan.metrics, vec!["spattack", "dps", "ehp"]);
        assert!(plan.ranker().is_some());
        assert_eq!(plan.weights.weights(), &[5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_stack_range() {
        let mut options = SearchOptions::new("Cramorant");
        options.stacks = Some((2, 4));
        let plan = resolve(&options).unwrap();
        assert_eq!(plan.stack_counts(true), 2..=4);
        assert_eq!(plan.stack_counts(false), 0..=0);

        options.stacks = Some((4, 2));
        assert!(resolve(&options).is_err());
        options.stacks = Some((0, 7));
        assert!(resolve(&options).is_err());
    }
}
