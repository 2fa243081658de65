//! Search options: the parsed form of everything a user can ask for.
//!
//! Options are plain serde data. Nothing here touches the catalog; name
//! resolution and cross-field validation happen when a search plan is built.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{CHARACTER_MAX_LEVEL, SearchError, Stat};

/// Equipment level used when an item is given without one.
pub const DEFAULT_ITEM_LEVEL: u8 = 20;

/// Top-level options for one search invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Character to build for.
    pub character: String,
    /// Target character levels. Empty means every level.
    #[serde(default)]
    pub levels: LevelSpec,
    /// Up to three held items, each with an optional level.
    #[serde(default)]
    pub items: Vec<ItemChoice>,
    /// Level for items given without one (1-30).
    #[serde(default = "default_item_level")]
    pub default_item_level: u8,
    /// Ability picks by 1-based index or by name, at most one per line.
    #[serde(default)]
    pub abilities: Vec<AbilityRef>,
    /// Try every choice for lines left unspecified instead of the first.
    #[serde(default)]
    pub all_abilities: bool,
    /// How held items are searched.
    #[serde(default)]
    pub equipment_search: EquipmentSearch,
    /// Modifier page, fixed or searched.
    #[serde(default)]
    pub emblems: EmblemOptions,
    /// Metrics (or metric groups) to record per level.
    #[serde(default)]
    pub show: Vec<String>,
    /// Metrics to rank by, highest priority first. Empty disables ranking.
    #[serde(default)]
    pub sort: Vec<String>,
    /// Inclusive stack count range; only applies when something scales with stacks.
    #[serde(default)]
    pub stacks: Option<(u32, u32)>,
    #[serde(default)]
    pub crit: CritMode,
    /// Level weighting for fitness; defaults by character role.
    #[serde(default)]
    pub weights: Option<LevelWeighting>,
    /// Target the damage figures are computed against.
    #[serde(default)]
    pub enemy: Option<Target>,
}

fn default_item_level() -> u8 {
    DEFAULT_ITEM_LEVEL
}

impl SearchOptions {
    /// Options with only the character set.
    pub fn new(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            levels: LevelSpec::default(),
            items: Vec::new(),
            default_item_level: DEFAULT_ITEM_LEVEL,
            abilities: Vec::new(),
            all_abilities: false,
            equipment_search: EquipmentSearch::default(),
            emblems: EmblemOptions::default(),
            show: Vec::new(),
            sort: Vec::new(),
            stacks: None,
            crit: CritMode::default(),
            weights: None,
            enemy: None,
        }
    }

    /// An example level-permutation search, printed by `--example`.
    pub fn example() -> Self {
        Self {
            levels: LevelSpec::Text("5-15".to_string()),
            items: vec![
                ItemChoice::leveled("WiseGlasses", 30),
                ItemChoice::new("SpAtkSpecs"),
                ItemChoice::new("ShellBell"),
            ],
            equipment_search: EquipmentSearch::ItemLevels {
                pool: vec![30, 20],
            },
            show: vec!["spattack".to_string(), "dps".to_string()],
            sort: vec!["dps".to_string()],
            stacks: Some((6, 6)),
            ..Self::new("Cramorant")
        }
    }
}

/// Target character levels, as a list or as `"a-b"`, `"a,b,c"` or `"a"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    List(Vec<u8>),
    Text(String),
}

impl Default for LevelSpec {
    fn default() -> Self {
        LevelSpec::List(Vec::new())
    }
}

impl LevelSpec {
    /// Expand to a validated level list; empty means levels 1-15.
    pub fn resolve(&self) -> Result<Vec<u8>, SearchError> {
        let raw: Vec<i64> = match self {
            LevelSpec::List(levels) => levels.iter().map(|&l| i64::from(l)).collect(),
            LevelSpec::Text(text) => parse_level_text(text)?,
        };
        if raw.is_empty() {
            return Ok((1..=CHARACTER_MAX_LEVEL).collect());
        }

        raw.into_iter()
            .map(|l| {
                SearchError::check_range("Level", l, 1, i64::from(CHARACTER_MAX_LEVEL))?;
                Ok(l as u8)
            })
            .collect()
    }
}

fn parse_level_text(text: &str) -> Result<Vec<i64>, SearchError> {
    let number = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| SearchError::InvalidOption {
                option: "levels",
                reason: format!("level is not a number: {}", s.trim()),
            })
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    if let Some((min, max)) = text.split_once('-') {
        let (min, max) = (number(min)?, number(max)?);
        if min > max {
            return Err(SearchError::InvalidOption {
                option: "levels",
                reason: format!("empty range {}-{}", min, max),
            });
        }
        for bound in [min, max] {
            SearchError::check_range("Level", bound, 1, i64::from(CHARACTER_MAX_LEVEL))?;
        }
        return Ok((min..=max).collect());
    }
    text.split(',').map(number).collect()
}

/// A held item, optionally with an explicit level.
///
/// Deserializes from `{"name": .., "level": ..}` or from `"Name"` / `"Name=20"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemChoice {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl ItemChoice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: None,
        }
    }

    pub fn leveled(name: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            level: Some(level),
        }
    }
}

impl FromStr for ItemChoice {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, level)) if !name.is_empty() => {
                let level = level.trim().parse::<u8>().map_err(|_| SearchError::InvalidOption {
                    option: "item",
                    reason: format!("{} expected item=level", s),
                })?;
                Ok(ItemChoice::leveled(name.trim(), level))
            }
            Some(_) => Err(SearchError::InvalidOption {
                option: "item",
                reason: format!("{} has no item name", s),
            }),
            None => Ok(ItemChoice::new(s.trim())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemChoiceRepr {
    String(String),
    Full {
        name: String,
        #[serde(default)]
        level: Option<u8>,
    },
}

impl<'de> Deserialize<'de> for ItemChoice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match ItemChoiceRepr::deserialize(deserializer)? {
            ItemChoiceRepr::String(s) => s.parse().map_err(serde::de::Error::custom),
            ItemChoiceRepr::Full { name, level } => Ok(ItemChoice { name, level }),
        }
    }
}

/// An ability pick: 1-based choice index or choice name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AbilityRef {
    Index(u8),
    Name(String),
}

/// Equipment search strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EquipmentSearch {
    /// Evaluate exactly the given items.
    #[default]
    Fixed,
    /// Fill the open slots with every combination of catalog items.
    Items,
    /// Distribute a pool of levels over the items given without a level.
    ItemLevels {
        #[serde(default)]
        pool: Vec<u8>,
    },
}

impl EquipmentSearch {
    pub fn is_search(&self) -> bool {
        !matches!(self, EquipmentSearch::Fixed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EquipmentSearch::Fixed => "fixed",
            EquipmentSearch::Items => "items",
            EquipmentSearch::ItemLevels { .. } => "itemlevels",
        }
    }
}

/// A modifier with a count: an exact count on a page, a maximum in a palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmblemPick {
    pub name: String,
    pub count: usize,
}

impl EmblemPick {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Modifier page selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EmblemOptions {
    /// No modifiers.
    #[default]
    None,
    /// One explicit page; counts must add up to the page capacity.
    Page { picks: Vec<EmblemPick> },
    /// Every page buildable from the palette that meets the minimums.
    Search {
        palette: Vec<EmblemPick>,
        /// Minimum number of picks per family.
        #[serde(default)]
        min_family: BTreeMap<String, usize>,
        /// Minimum summed page value per stat.
        #[serde(default)]
        min_stat: BTreeMap<Stat, f64>,
    },
}

impl EmblemOptions {
    pub fn is_search(&self) -> bool {
        matches!(self, EmblemOptions::Search { .. })
    }
}

/// How critical hits enter damage figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CritMode {
    /// Never crit.
    None,
    /// Average over the crit chance.
    #[default]
    Expected,
    /// Always crit.
    Max,
}

/// Named per-level weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightProfile {
    /// Every level counts the same.
    Flat,
    /// Early levels count most.
    Early,
    /// Levels around the middle of the game count most.
    Mid,
    /// Late levels count most.
    Late,
}

/// Level weighting: a named profile or one weight per requested level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelWeighting {
    Profile(WeightProfile),
    Explicit(Vec<f64>),
}

/// Defensive stats of the target damage is dealt to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    pub defense: f64,
    pub spdefense: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_spec_forms() {
        assert_eq!(LevelSpec::default().resolve().unwrap().len(), 15);
        assert_eq!(
            LevelSpec::Text("3-6".into()).resolve().unwrap(),
            vec![3, 4, 5, 6]
        );
        assert_eq!(
            LevelSpec::Text("1,5,9".into()).resolve().unwrap(),
            vec![1, 5, 9]
        );
        assert_eq!(LevelSpec::Text("7".into()).resolve().unwrap(), vec![7]);
        assert_eq!(LevelSpec::List(vec![2, 4]).resolve().unwrap(), vec![2, 4]);
    }

    #[test]
    fn test_level_spec_errors() {
        assert!(matches!(
            LevelSpec::Text("0-3".into()).resolve(),
            Err(SearchError::OutOfRange { value: 0, .. })
        ));
        assert!(matches!(
            LevelSpec::List(vec![16]).resolve(),
            Err(SearchError::OutOfRange { value: 16, .. })
        ));
        assert!(matches!(
            LevelSpec::Text("x".into()).resolve(),
            Err(SearchError::InvalidOption { .. })
        ));
        assert!(LevelSpec::Text("9-3".into()).resolve().is_err());
    }

    #[test]
    fn test_huge_level_range_rejected() {
        assert!(matches!(
            LevelSpec::Text("1-4000000000000000000".into()).resolve(),
            Err(SearchError::OutOfRange { value: 4000000000000000000, .. })
        ));
        assert!(matches!(
            LevelSpec::Text("-5-100000000".into()).resolve(),
            Err(SearchError::InvalidOption { .. })
        ));
        assert!(matches!(
            LevelSpec::Text("3-100000000".into()).resolve(),
            Err(SearchError::OutOfRange { value: 100000000, .. })
        ));
    }

    #[test]
    fn test_item_choice_parsing() {
        assert_eq!(
            "AeosCookie=20".parse::<ItemChoice>().unwrap(),
            ItemChoice::leveled("AeosCookie", 20)
        );
        assert_eq!(
            "AeosCookie".parse::<ItemChoice>().unwrap(),
            ItemChoice::new("AeosCookie")
        );
        assert!("AeosCookie=x".parse::<ItemChoice>().is_err());
        assert!("=5".parse::<ItemChoice>().is_err());
    }

    #[test]
    fn test_options_json() {
        let json = r#"{
            "character": "Cramorant",
            "levels": "5-7",
            "items": ["WiseGlasses=30", {"name": "ShellBell"}, "SpAtkSpecs"],
            "abilities": [1, "Hurricane"],
            "equipment_search": {"mode": "item_levels", "pool": [30, 10]},
            "emblems": {
                "mode": "search",
                "palette": [{"name": "SparkOrb", "count": 6}],
                "min_stat": {"spattack": 4.0}
            },
            "sort": ["dps"],
            "crit": "max",
            "weights": "late"
        }"#;
        let options: SearchOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.items[0], ItemChoice::leveled("WiseGlasses", 30));
        assert_eq!(options.items[1], ItemChoice::new("ShellBell"));
        assert_eq!(options.abilities[0], AbilityRef::Index(1));
        assert_eq!(options.abilities[1], AbilityRef::Name("Hurricane".into()));
        assert_eq!(
            options.equipment_search,
            EquipmentSearch::ItemLevels { pool: vec![30, 10] }
        );
        assert!(options.emblems.is_search());
        assert_eq!(options.crit, CritMode::Max);
        assert_eq!(
            options.weights,
            Some(LevelWeighting::Profile(WeightProfile::Late))
        );
        assert_eq!(options.default_item_level, DEFAULT_ITEM_LEVEL);
    }

    #[test]
    fn test_explicit_weights_json() {
        let weights: LevelWeighting = serde_json::from_str("[1.0, 2.0, 0.5]").unwrap();
        assert_eq!(weights, LevelWeighting::Explicit(vec![1.0, 2.0, 0.5]));
    }

    #[test]
    fn test_example_serializes() {
        let json = serde_json::to_string_pretty(&SearchOptions::example()).unwrap();
        let parsed: SearchOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.character, "Cramorant");
        assert_eq!(parsed.items.len(), 3);
    }
}
