//! Concrete builds: a character at one level with equipment, modifiers,
//! ability picks and a stack count, plus the point math for moves.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::schema::{
    CHARACTER_MAX_LEVEL, Capabilities, CharacterRecord, CritMode, Effect, ITEM_MAX_LEVEL,
    ItemPassive, ItemRecord, ModifierRecord, MoveRecord, Recipient, Scaling, SearchError, Stats,
    Target,
};

/// Number of equipment slots on every build.
pub const EQUIPMENT_SLOTS: usize = 3;

/// Defense constant in the damage mitigation formula `600 / (600 + def)`.
pub const MITIGATION_CONSTANT: f64 = 600.0;

/// Crit damage multiplier before any crit damage bonus.
pub const BASE_CRIT_MULTIPLIER: f64 = 2.0;

/// Points produced by one action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PointStore {
    pub damage: f64,
    pub self_heal: f64,
    pub ally_heal: f64,
    pub self_shield: f64,
    pub ally_shield: f64,
}

impl PointStore {
    pub fn healing(&self) -> f64 {
        self.self_heal + self.ally_heal
    }

    pub fn shielding(&self) -> f64 {
        self.self_shield + self.ally_shield
    }
}

impl AddAssign for PointStore {
    fn add_assign(&mut self, rhs: Self) {
        self.damage += rhs.damage;
        self.self_heal += rhs.self_heal;
        self.ally_heal += rhs.ally_heal;
        self.self_shield += rhs.self_shield;
        self.ally_shield += rhs.ally_shield;
    }
}

impl Add for PointStore {
    type Output = PointStore;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

/// Something a build can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Basic,
    Boosted,
    /// The move learned in ability line `n` (0-based).
    Ability(usize),
}

/// One equipment slot; `item == None` is the empty placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquipmentSlot<'a> {
    pub item: Option<&'a ItemRecord>,
    pub level: u8,
}

impl<'a> EquipmentSlot<'a> {
    pub const EMPTY: EquipmentSlot<'static> = EquipmentSlot {
        item: None,
        level: 0,
    };

    pub fn new(item: &'a ItemRecord, level: u8) -> Self {
        Self {
            item: Some(item),
            level,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.item
            .map(ItemRecord::capabilities)
            .unwrap_or(Capabilities::NONE)
    }
}

impl fmt::Display for EquipmentSlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item {
            Some(item) => write!(f, "{}@{}", item.name, self.level),
            None => f.write_str("-"),
        }
    }
}

/// Exactly three slots, padded with [`EquipmentSlot::EMPTY`].
pub type Equipment<'a> = [EquipmentSlot<'a>; EQUIPMENT_SLOTS];

/// Combined capabilities of every item in `equipment`.
pub fn equipment_capabilities(equipment: &Equipment<'_>) -> Capabilities {
    equipment
        .iter()
        .fold(Capabilities::NONE, |caps, slot| caps | slot.capabilities())
}

/// A modifier page: modifier types with pick counts.
///
/// Non-empty pages always hold exactly [`ModifierSet::CAPACITY`] picks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierSet<'a> {
    picks: Vec<(&'a ModifierRecord, usize)>,
}

impl<'a> ModifierSet<'a> {
    pub const CAPACITY: usize = 10;

    pub fn empty() -> Self {
        Self { picks: Vec::new() }
    }

    /// A page from explicit picks. Repeated modifiers are merged and
    /// zero counts dropped; the total must equal the capacity.
    pub fn from_picks(
        picks: impl IntoIterator<Item = (&'a ModifierRecord, usize)>,
    ) -> Result<Self, SearchError> {
        let mut merged: Vec<(&'a ModifierRecord, usize)> = Vec::new();
        for (modifier, count) in picks {
            if count == 0 {
                continue;
            }
            match merged.iter_mut().find(|(m, _)| m.name == modifier.name) {
                Some((_, existing)) => *existing += count,
                None => merged.push((modifier, count)),
            }
        }

        let total: usize = merged.iter().map(|(_, count)| count).sum();
        if total != Self::CAPACITY {
            return Err(SearchError::ModifierSetSize {
                count: total,
                expected: Self::CAPACITY,
            });
        }
        Ok(Self { picks: merged })
    }

    /// Caller guarantees a full page with no zero counts.
    pub(crate) fn from_full(picks: Vec<(&'a ModifierRecord, usize)>) -> Self {
        debug_assert_eq!(
            picks.iter().map(|(_, count)| count).sum::<usize>(),
            Self::CAPACITY
        );
        Self { picks }
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn picks(&self) -> &[(&'a ModifierRecord, usize)] {
        &self.picks
    }

    pub fn total(&self) -> usize {
        self.picks.iter().map(|(_, count)| count).sum()
    }

    pub fn count_of(&self, name: &str) -> usize {
        self.picks
            .iter()
            .find(|(m, _)| m.name == name)
            .map_or(0, |(_, count)| *count)
    }

    /// Number of picks belonging to `family`.
    pub fn family_count(&self, family: &str) -> usize {
        self.picks
            .iter()
            .filter(|(m, _)| m.in_family(family))
            .map(|(_, count)| count)
            .sum()
    }

    /// Summed stats of every pick.
    pub fn stats(&self) -> Stats {
        self.picks
            .iter()
            .fold(Stats::default(), |acc, (m, count)| {
                acc + m.stats.scaled(*count as f64)
            })
    }

    pub fn capabilities(&self) -> Capabilities {
        self.picks
            .iter()
            .fold(Capabilities::NONE, |caps, (m, _)| caps | m.capabilities())
    }
}

impl fmt::Display for ModifierSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.picks.is_empty() {
            return f.write_str("-");
        }
        for (i, (modifier, count)) in self.picks.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}x{}", count, modifier.name)?;
        }
        Ok(())
    }
}

/// Chosen index per ability line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AbilitySelection {
    pub lines: [usize; 2],
}

impl AbilitySelection {
    pub fn new(first: usize, second: usize) -> Self {
        Self {
            lines: [first, second],
        }
    }

    /// Names of the chosen abilities, e.g. `"Surf/Hurricane"`.
    pub fn label(&self, character: &CharacterRecord) -> String {
        let name = |line: usize| {
            character.lines[line]
                .choices
                .get(self.lines[line])
                .map_or("?", |c| c.name.as_str())
        };
        format!("{}/{}", name(0), name(1))
    }
}

/// Everything needed to materialize one build.
#[derive(Debug, Clone)]
pub struct BuildSpec<'a> {
    pub character: &'a CharacterRecord,
    pub level: u8,
    pub equipment: Equipment<'a>,
    pub abilities: AbilitySelection,
    pub stacks: u32,
    pub modifiers: &'a ModifierSet<'a>,
}

/// A materialized build at one level.
pub trait BuildInstance {
    fn level(&self) -> u8;
    fn stats(&self) -> &Stats;
    fn capabilities(&self) -> Capabilities;
    /// Base attacks per second before the attack speed stat.
    fn attacks_per_second(&self) -> f64;
    /// Every n-th basic attack is boosted.
    fn boosted_every(&self) -> u8;
    fn outcome(&self, action: Action, target: Option<&Target>, crit: CritMode) -> PointStore;
    /// Cooldown in seconds before cooldown reduction; 0 for attacks.
    fn cooldown(&self, action: Action) -> f64;
}

/// Turns build specs into build instances.
pub trait BuildEvaluator {
    type Build<'a>: BuildInstance;

    fn build<'a>(&self, spec: &BuildSpec<'a>) -> Result<Self::Build<'a>, SearchError>;
}

/// Evaluator that sums character, item and modifier stats and applies
/// item passives and stack bonuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatEvaluator;

/// Build produced by [`StatEvaluator`].
#[derive(Debug, Clone)]
pub struct StatBuild<'a> {
    character: &'a CharacterRecord,
    level: u8,
    stats: Stats,
    capabilities: Capabilities,
    moves: [Option<&'a MoveRecord>; 2],
}

impl BuildEvaluator for StatEvaluator {
    type Build<'a> = StatBuild<'a>;

    fn build<'a>(&self, spec: &BuildSpec<'a>) -> Result<StatBuild<'a>, SearchError> {
        let character = spec.character;
        SearchError::check_range(
            "Level",
            i64::from(spec.level),
            1,
            i64::from(CHARACTER_MAX_LEVEL),
        )?;

        let base = character.stats_at(spec.level);
        let mut stats = base + spec.modifiers.stats();
        let mut capabilities = character.capabilities() | spec.modifiers.capabilities();

        for slot in &spec.equipment {
            let Some(item) = slot.item else { continue };
            SearchError::check_range(
                "Item level",
                i64::from(slot.level),
                1,
                i64::from(ITEM_MAX_LEVEL),
            )?;

            stats += item.stats_at(slot.level);
            capabilities = capabilities | item.capabilities();

            let unlock = item.unlock_at(slot.level);
            match item.passive {
                ItemPassive::None => {}
                ItemPassive::StackScaling { stat } => {
                    *stats.get_mut(stat) += unlock * f64::from(spec.stacks);
                }
                ItemPassive::BaseStatPercent { stat } => {
                    *stats.get_mut(stat) += unlock * base.get(stat);
                }
            }
        }

        if let Some(bonus) = character.stack_bonus {
            *stats.get_mut(bonus.stat) += bonus.per_stack * f64::from(spec.stacks);
        }

        let moves = [0, 1].map(|line| {
            character.lines[line].move_at(spec.level, spec.abilities.lines[line])
        });

        Ok(StatBuild {
            character,
            level: spec.level,
            stats,
            capabilities,
            moves,
        })
    }
}

impl StatBuild<'_> {
    fn record(&self, action: Action) -> Option<&MoveRecord> {
        match action {
            Action::Basic => Some(&self.character.basic),
            Action::Boosted => Some(&self.character.boosted),
            Action::Ability(line) => self.moves.get(line).copied().flatten(),
        }
    }

    /// Name of the move learned in `line` at this level.
    pub fn move_name(&self, line: usize) -> Option<&str> {
        self.moves
            .get(line)
            .copied()
            .flatten()
            .map(|m| m.name.as_str())
    }
}

impl BuildInstance for StatBuild<'_> {
    fn level(&self) -> u8 {
        self.level
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn attacks_per_second(&self) -> f64 {
        self.character.attacks_per_second
    }

    fn boosted_every(&self) -> u8 {
        self.character.boosted_every
    }

    fn outcome(&self, action: Action, target: Option<&Target>, crit: CritMode) -> PointStore {
        self.record(action)
            .map(|m| m.effect.calc(self, target, crit))
            .unwrap_or_default()
    }

    fn cooldown(&self, action: Action) -> f64 {
        match action {
            Action::Basic | Action::Boosted => 0.0,
            Action::Ability(_) => self.record(action).map_or(0.0, |m| m.cooldown),
        }
    }
}

// ============================================================================
// Move math
// ============================================================================

impl Scaling {
    /// Raw amount for a build with `stats` at `level`.
    pub fn amount(&self, stats: &Stats, level: u8) -> f64 {
        self.attack * stats.attack
            + self.spattack * stats.spattack
            + self.per_level * f64::from(level.saturating_sub(1))
            + self.flat
    }

    /// Physical when attack scaling dominates.
    pub fn is_physical(&self) -> bool {
        self.attack > 0.0 && self.attack >= self.spattack
    }
}

/// Damage multiplier from a target's defenses.
pub fn mitigation(defense: f64) -> f64 {
    MITIGATION_CONSTANT / (MITIGATION_CONSTANT + defense.max(0.0))
}

fn crit_factor(stats: &Stats, crit: CritMode) -> f64 {
    let multiplier = BASE_CRIT_MULTIPLIER + stats.critdamage;
    match crit {
        CritMode::None => 1.0,
        CritMode::Expected => 1.0 + stats.critrate.clamp(0.0, 1.0) * (multiplier - 1.0),
        CritMode::Max => multiplier,
    }
}

impl Effect {
    /// Points produced when `build` uses this effect on `target`.
    pub fn calc(
        &self,
        build: &dyn BuildInstance,
        target: Option<&Target>,
        crit: CritMode,
    ) -> PointStore {
        let stats = build.stats();
        let level = build.level();
        match self {
            Effect::Damaging { scaling } => {
                let mut damage = scaling.amount(stats, level);
                if let Some(target) = target {
                    let defense = if scaling.is_physical() {
                        target.defense
                    } else {
                        target.spdefense
                    };
                    damage *= mitigation(defense);
                }
                if self.can_crit() {
                    damage *= crit_factor(stats, crit);
                }
                PointStore {
                    damage,
                    self_heal: damage * stats.lifesteal,
                    ..Default::default()
                }
            }
            Effect::Healing { scaling, recipient } => {
                let amount = scaling.amount(stats, level);
                match recipient {
                    Recipient::User => PointStore {
                        self_heal: amount,
                        ..Default::default()
                    },
                    Recipient::Ally => PointStore {
                        ally_heal: amount,
                        ..Default::default()
                    },
                }
            }
            Effect::Shielding { scaling, recipient } => {
                let amount = scaling.amount(stats, level);
                match recipient {
                    Recipient::User => PointStore {
                        self_shield: amount,
                        ..Default::default()
                    },
                    Recipient::Ally => PointStore {
                        ally_shield: amount,
                        ..Default::default()
                    },
                }
            }
            Effect::Status { .. } => PointStore::default(),
            Effect::Combo { hits } => hits
                .iter()
                .map(|hit| hit.calc(build, target, crit))
                .fold(PointStore::default(), |acc, points| acc + points),
        }
    }

    /// Only physical damage can crit.
    pub fn can_crit(&self) -> bool {
        match self {
            Effect::Damaging { scaling } => scaling.is_physical(),
            Effect::Combo { hits } => hits.iter().any(Effect::can_crit),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Catalog, CatalogProvider};

    fn spec<'a>(
        catalog: &'a Catalog,
        character: &str,
        level: u8,
        items: &[(&str, u8)],
        modifiers: &'a ModifierSet<'a>,
        stacks: u32,
    ) -> BuildSpec<'a> {
        let mut equipment = [EquipmentSlot::EMPTY; EQUIPMENT_SLOTS];
        for (slot, (name, item_level)) in equipment.iter_mut().zip(items) {
            *slot = EquipmentSlot::new(catalog.lookup_item(name).unwrap(), *item_level);
        }
        BuildSpec {
            character: catalog.lookup_character(character).unwrap(),
            level,
            equipment,
            abilities: AbilitySelection::default(),
            stacks,
            modifiers,
        }
    }

    #[test]
    fn test_bare_build_matches_base_stats() {
        let catalog = Catalog::builtin();
        let empty = ModifierSet::empty();
        let build = StatEvaluator
            .build(&spec(&catalog, "Cramorant", 9, &[], &empty, 0))
            .unwrap();
        assert_eq!(build.stats().spattack, 331.0);
        assert_eq!(build.stats().health, 4517.0);
        assert!(!build.capabilities().stacks);
    }

    #[test]
    fn test_item_stats_and_stack_passive() {
        let catalog = Catalog::builtin();
        let empty = ModifierSet::empty();
        let build = StatEvaluator
            .build(&spec(
                &catalog,
                "Cramorant",
                1,
                &[("SpAtkSpecs", 20)],
                &empty,
                6,
            ))
            .unwrap();
        // 50 base + 0.8 * 20 + 12 per stack * 6
        assert!((build.stats().spattack - (50.0 + 16.0 + 72.0)).abs() < 1e-9);
        assert!(build.capabilities().stacks);
    }

    #[test]
    fn test_base_stat_percent_passive() {
        let catalog = Catalog::builtin();
        let empty = ModifierSet::empty();
        let build = StatEvaluator
            .build(&spec(
                &catalog,
                "Cramorant",
                15,
                &[("WiseGlasses", 30)],
                &empty,
                0,
            ))
            .unwrap();
        // 739 base + 39 item + 7% of base
        let expected = 739.0 + 39.0 + 0.07 * 739.0;
        assert!((build.stats().spattack - expected).abs() < 1e-9);
    }

    #[test]
    fn test_modifier_page_stats() {
        let catalog = Catalog::builtin();
        let spark = catalog.lookup_modifier("SparkOrb").unwrap();
        let leaf = catalog.lookup_modifier("LeafBlade").unwrap();
        let page = ModifierSet::from_picks([(spark, 4), (leaf, 6)]).unwrap();
        assert!((page.stats().spattack - (4.0 * 1.2 + 6.0 * 1.6)).abs() < 1e-9);
        assert_eq!(page.family_count("yellow"), 4);
        assert_eq!(page.family_count("green"), 6);
        assert_eq!(page.to_string(), "4xSparkOrb 6xLeafBlade");

        let err = ModifierSet::from_picks([(spark, 4)]).unwrap_err();
        assert_eq!(
            err,
            SearchError::ModifierSetSize {
                count: 4,
                expected: 10
            }
        );
        let merged = ModifierSet::from_picks([(spark, 4), (spark, 6), (leaf, 0)]).unwrap();
        assert_eq!(merged.picks().len(), 1);
        assert_eq!(merged.count_of("SparkOrb"), 10);
    }

    #[test]
    fn test_invalid_levels_rejected() {
        let catalog = Catalog::builtin();
        let empty = ModifierSet::empty();
        assert!(
            StatEvaluator
                .build(&spec(&catalog, "Absol", 16, &[], &empty, 0))
                .is_err()
        );
        assert!(
            StatEvaluator
                .build(&spec(&catalog, "Absol", 5, &[("ScopeLens", 31)], &empty, 0))
                .is_err()
        );
    }

    #[test]
    fn test_damage_mitigation_and_crit() {
        let catalog = Catalog::builtin();
        let empty = ModifierSet::empty();
        let build = StatEvaluator
            .build(&spec(&catalog, "Absol", 15, &[], &empty, 0))
            .unwrap();

        let plain = build.outcome(Action::Basic, None, CritMode::None);
        assert_eq!(plain.damage, 620.0);

        let maxed = build.outcome(Action::Basic, None, CritMode::Max);
        assert_eq!(maxed.damage, 1240.0);

        // 10% crit chance, double damage
        let expected = build.outcome(Action::Basic, None, CritMode::Expected);
        assert!((expected.damage - 620.0 * 1.1).abs() < 1e-9);

        let target = Target {
            defense: 600.0,
            spdefense: 0.0,
        };
        let mitigated = build.outcome(Action::Basic, Some(&target), CritMode::None);
        assert!((mitigated.damage - 310.0).abs() < 1e-9);
    }

    #[test]
    fn test_ability_moves_by_level() {
        let catalog = Catalog::builtin();
        let empty = ModifierSet::empty();

        let early = StatEvaluator
            .build(&spec(&catalog, "Absol", 2, &[], &empty, 0))
            .unwrap();
        assert_eq!(early.move_name(0), Some("Feint"));
        assert_eq!(early.move_name(1), None);
        assert_eq!(early.outcome(Action::Ability(1), None, CritMode::None).damage, 0.0);
        assert_eq!(early.cooldown(Action::Ability(1)), 0.0);

        let late = StatEvaluator
            .build(&spec(&catalog, "Absol", 13, &[], &empty, 0))
            .unwrap();
        assert_eq!(late.move_name(0), Some("PsychoCut+"));
        assert_eq!(late.move_name(1), Some("NightSlash+"));
        assert_eq!(late.cooldown(Action::Ability(1)), 4.5);
        assert_eq!(late.cooldown(Action::Basic), 0.0);
    }

    #[test]
    fn test_combo_points() {
        let catalog = Catalog::builtin();
        let empty = ModifierSet::empty();
        let mut spec = spec(&catalog, "Absol", 13, &[], &empty, 0);
        spec.abilities = AbilitySelection::new(0, 1);
        let build = StatEvaluator.build(&spec).unwrap();
        assert_eq!(build.move_name(1), Some("SuckerPunch+"));

        let points = build.outcome(Action::Ability(1), None, CritMode::None);
        // 513 attack at level 13
        assert!((points.damage - (1.7 * 513.0 + 15.0 * 12.0 + 340.0)).abs() < 1e-9);
        assert!((points.self_shield - (0.8 * 513.0 + 140.0)).abs() < 1e-9);
        assert_eq!(points.shielding(), points.self_shield);
    }

    #[test]
    fn test_special_moves_never_crit() {
        let catalog = Catalog::builtin();
        let cramorant = catalog.lookup_character("Cramorant").unwrap();
        assert!(!cramorant.boosted.effect.can_crit());
        assert!(cramorant.basic.effect.can_crit());
    }
}
