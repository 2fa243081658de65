//! Static game data: characters, items and modifiers.
//!
//! The [`Catalog`] is built once, validated, and then only read. Search code
//! reaches it through the [`CatalogProvider`] trait so other data sources can
//! be plugged in.

use std::collections::HashMap;
use std::fs;
use std::ops::BitOr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{NameKind, SearchError, Stat, Stats};

/// Highest equipment level.
pub const ITEM_MAX_LEVEL: u8 = 30;
/// Highest character level.
pub const CHARACTER_MAX_LEVEL: u8 = 15;

/// Capability flags used to decide which search dimensions apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Something in the build can land critical hits.
    pub crit: bool,
    /// Something in the build scales with the stack count.
    pub stacks: bool,
    /// The character deals physical damage.
    pub physical: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        crit: false,
        stacks: false,
        physical: false,
    };

    pub fn union(self, other: Capabilities) -> Capabilities {
        Capabilities {
            crit: self.crit || other.crit,
            stacks: self.stacks || other.stacks,
            physical: self.physical || other.physical,
        }
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Damage category of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackType {
    Physical,
    Special,
}

/// Character role, used to pick a default level weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Attacker,
    Defender,
    Speedster,
    Supporter,
    AllRounder,
}

/// Passive effect attached to an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemPassive {
    #[default]
    None,
    /// Adds `unlock × stacks` to `stat`.
    StackScaling { stat: Stat },
    /// Adds `unlock × base stat` of the character at its current level.
    BaseStatPercent { stat: Stat },
}

/// Per-stack bonus granted by a character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackBonus {
    pub stat: Stat,
    pub per_stack: f64,
}

/// Coefficients of a damage, healing or shield amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scaling {
    /// Multiplier on attack.
    pub attack: f64,
    /// Multiplier on special attack.
    pub spattack: f64,
    /// Added per character level above 1.
    pub per_level: f64,
    pub flat: f64,
}

/// Who receives a healing or shield effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    #[default]
    #[serde(rename = "self")]
    User,
    Ally,
}

/// What a move does. Evaluated by `Effect::calc` in the build module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    Damaging {
        scaling: Scaling,
    },
    Healing {
        scaling: Scaling,
        #[serde(default)]
        recipient: Recipient,
    },
    Shielding {
        scaling: Scaling,
        #[serde(default)]
        recipient: Recipient,
    },
    /// Buff or debuff with no direct point value.
    Status {
        duration: f64,
        #[serde(default)]
        stats: Stats,
    },
    /// Several hits resolved one after another.
    Combo { hits: Vec<Effect> },
}

/// A named move with its cooldown in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub name: String,
    #[serde(default)]
    pub cooldown: f64,
    pub effect: Effect,
}

/// Upgraded form of an ability, available from `level` on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub level: u8,
    #[serde(rename = "move")]
    pub record: MoveRecord,
}

/// One of the selectable abilities in a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityChoice {
    pub name: String,
    #[serde(rename = "move")]
    pub base: MoveRecord,
    #[serde(default)]
    pub upgrade: Option<Upgrade>,
}

/// An ability line: a starter move, later replaced by one of `choices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityLine {
    pub unlock_level: u8,
    pub choose_level: u8,
    pub starter: MoveRecord,
    pub choices: Vec<AbilityChoice>,
}

impl AbilityLine {
    /// The move this line provides at `level` for the given choice index.
    pub fn move_at(&self, level: u8, choice: usize) -> Option<&MoveRecord> {
        if level < self.unlock_level {
            return None;
        }
        if level < self.choose_level {
            return Some(&self.starter);
        }
        let chosen = self.choices.get(choice)?;
        match &chosen.upgrade {
            Some(upgrade) if level >= upgrade.level => Some(&upgrade.record),
            _ => Some(&chosen.base),
        }
    }

    /// Index of the choice called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.choices.iter().position(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    /// Stats for levels 1 through 30.
    pub progression: Vec<Stats>,
    /// Passive strength per tier (levels 1-10, 11-20, 21-30).
    pub unlocks: [f64; 3],
    #[serde(default)]
    pub passive: ItemPassive,
    /// Restricts the item to characters of one attack type in item searches.
    #[serde(default)]
    pub affinity: Option<AttackType>,
    #[serde(skip)]
    capabilities: Capabilities,
}

impl ItemRecord {
    pub fn new(
        name: impl Into<String>,
        progression: Vec<Stats>,
        unlocks: [f64; 3],
        passive: ItemPassive,
        affinity: Option<AttackType>,
    ) -> Self {
        let mut item = Self {
            name: name.into(),
            progression,
            unlocks,
            passive,
            affinity,
            capabilities: Capabilities::NONE,
        };
        item.refresh_capabilities();
        item
    }

    /// Stats at `level`; level 0 means unequipped.
    pub fn stats_at(&self, level: u8) -> Stats {
        match level {
            0 => Stats::default(),
            l => self
                .progression
                .get(usize::from(l) - 1)
                .copied()
                .unwrap_or_default(),
        }
    }

    pub fn unlock_at(&self, level: u8) -> f64 {
        let tier = if level > 20 {
            2
        } else if level > 10 {
            1
        } else {
            0
        };
        self.unlocks[tier]
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether a character of `attack_type` may carry this item in item searches.
    pub fn suits(&self, attack_type: AttackType) -> bool {
        self.affinity.is_none_or(|a| a == attack_type)
    }

    fn refresh_capabilities(&mut self) {
        self.capabilities = Capabilities {
            crit: self.progression.last().is_some_and(|s| s.critrate > 0.0),
            stacks: matches!(self.passive, ItemPassive::StackScaling { .. }),
            physical: false,
        };
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.progression.len() != usize::from(ITEM_MAX_LEVEL) {
            return Err(CatalogError::Malformed {
                record: format!("Item {}", self.name),
                reason: format!(
                    "{} level progression instead of {}",
                    self.progression.len(),
                    ITEM_MAX_LEVEL
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub name: String,
    pub attack_type: AttackType,
    pub role: Role,
    /// Base stats for levels 1 through 15.
    pub progression: Vec<Stats>,
    #[serde(default = "default_attacks_per_second")]
    pub attacks_per_second: f64,
    pub basic: MoveRecord,
    pub boosted: MoveRecord,
    /// Every n-th basic attack is boosted.
    pub boosted_every: u8,
    pub lines: [AbilityLine; 2],
    #[serde(default)]
    pub stack_bonus: Option<StackBonus>,
    #[serde(skip)]
    pub(super) capabilities: Capabilities,
}

fn default_attacks_per_second() -> f64 {
    1.0
}

impl CharacterRecord {
    /// Base stats at `level` (1-15).
    pub fn stats_at(&self, level: u8) -> Stats {
        usize::from(level)
            .checked_sub(1)
            .and_then(|i| self.progression.get(i))
            .copied()
            .unwrap_or_default()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn refresh_capabilities(&mut self) {
        self.capabilities = Capabilities {
            crit: self.progression.last().is_some_and(|s| s.critrate > 0.0),
            stacks: self.stack_bonus.is_some(),
            physical: self.attack_type == AttackType::Physical,
        };
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.progression.len() != usize::from(CHARACTER_MAX_LEVEL) {
            return Err(CatalogError::Malformed {
                record: format!("Character {}", self.name),
                reason: format!(
                    "{} level progression instead of {}",
                    self.progression.len(),
                    CHARACTER_MAX_LEVEL
                ),
            });
        }
        if self.boosted_every == 0 {
            return Err(CatalogError::Malformed {
                record: format!("Character {}", self.name),
                reason: "boosted_every must be at least 1".to_string(),
            });
        }
        for line in &self.lines {
            if line.choices.is_empty() {
                return Err(CatalogError::Malformed {
                    record: format!("Character {}", self.name),
                    reason: format!(
                        "ability line starting with {} has no choices",
                        line.starter.name
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A cosmetic stat modifier ("emblem"). Stats may be negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierRecord {
    pub name: String,
    #[serde(default)]
    pub families: Vec<String>,
    pub stats: Stats,
}

impl ModifierRecord {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            crit: self.stats.critrate > 0.0,
            ..Capabilities::NONE
        }
    }

    pub fn in_family(&self, family: &str) -> bool {
        self.families.iter().any(|f| f == family)
    }
}

/// Name-based access to static records.
pub trait CatalogProvider {
    fn lookup_item(&self, name: &str) -> Result<&ItemRecord, SearchError>;
    fn lookup_character(&self, name: &str) -> Result<&CharacterRecord, SearchError>;
    fn lookup_modifier(&self, name: &str) -> Result<&ModifierRecord, SearchError>;
    /// Every item, in catalog order.
    fn items(&self) -> &[ItemRecord];
    /// Every modifier, in catalog order.
    fn modifiers(&self) -> &[ModifierRecord];
}

/// On-disk layout of a catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub modifiers: Vec<ModifierRecord>,
}

/// Validated, indexed, immutable registry.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    data: CatalogData,
    character_index: HashMap<String, usize>,
    item_index: HashMap<String, usize>,
    modifier_index: HashMap<String, usize>,
}

impl Catalog {
    /// Validate records, compute capability flags and build name indexes.
    pub fn new(mut data: CatalogData) -> Result<Self, CatalogError> {
        for character in &mut data.characters {
            character.validate()?;
            character.refresh_capabilities();
        }
        for item in &mut data.items {
            item.validate()?;
            item.refresh_capabilities();
        }

        let character_index = index_names("character", data.characters.iter().map(|c| &c.name))?;
        let item_index = index_names("item", data.items.iter().map(|i| &i.name))?;
        let modifier_index = index_names("modifier", data.modifiers.iter().map(|m| &m.name))?;

        log::debug!(
            "Catalog loaded: {} characters, {} items, {} modifiers",
            data.characters.len(),
            data.items.len(),
            data.modifiers.len()
        );

        Ok(Self {
            data,
            character_index,
            item_index,
            modifier_index,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;
        Self::new(data)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn data(&self) -> &CatalogData {
        &self.data
    }

    pub fn characters(&self) -> &[CharacterRecord] {
        &self.data.characters
    }
}

fn index_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a String>,
) -> Result<HashMap<String, usize>, CatalogError> {
    let mut index = HashMap::new();
    for (i, name) in names.enumerate() {
        if index.insert(name.clone(), i).is_some() {
            return Err(CatalogError::Duplicate {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(index)
}

impl CatalogProvider for Catalog {
    fn lookup_item(&self, name: &str) -> Result<&ItemRecord, SearchError> {
        self.item_index
            .get(name)
            .map(|&i| &self.data.items[i])
            .ok_or_else(|| SearchError::UnknownName {
                kind: NameKind::Item,
                name: name.to_string(),
            })
    }

    fn lookup_character(&self, name: &str) -> Result<&CharacterRecord, SearchError> {
        self.character_index
            .get(name)
            .map(|&i| &self.data.characters[i])
            .ok_or_else(|| SearchError::UnknownName {
                kind: NameKind::Character,
                name: name.to_string(),
            })
    }

    fn lookup_modifier(&self, name: &str) -> Result<&ModifierRecord, SearchError> {
        self.modifier_index
            .get(name)
            .map(|&i| &self.data.modifiers[i])
            .ok_or_else(|| SearchError::UnknownName {
                kind: NameKind::Modifier,
                name: name.to_string(),
            })
    }

    fn items(&self) -> &[ItemRecord] {
        &self.data.items
    }

    fn modifiers(&self) -> &[ModifierRecord] {
        &self.data.modifiers
    }
}

/// Catalog loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{record} is malformed: {reason}")]
    Malformed { record: String, reason: String },
    #[error("Duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_builtin_lookups() {
        let catalog = Catalog::builtin();
        assert!(catalog.lookup_item("AeosCookie").is_ok());
        assert!(catalog.lookup_character("Cramorant").is_ok());
        let err = catalog.lookup_item("Pebble").unwrap_err();
        assert_eq!(err.to_string(), "Unknown item: Pebble");
    }

    #[test]
    fn test_capabilities_computed_at_load() {
        let catalog = Catalog::builtin();
        assert!(catalog.lookup_item("AeosCookie").unwrap().capabilities().stacks);
        assert!(catalog.lookup_item("ScopeLens").unwrap().capabilities().crit);
        assert_eq!(
            catalog.lookup_item("AssaultVest").unwrap().capabilities(),
            Capabilities::NONE
        );
        assert!(catalog.lookup_character("Absol").unwrap().capabilities().physical);
        assert!(!catalog.lookup_character("Cramorant").unwrap().capabilities().physical);
    }

    #[test]
    fn test_unlock_tiers() {
        let catalog = Catalog::builtin();
        let cookie = catalog.lookup_item("AeosCookie").unwrap();
        assert_eq!(cookie.unlock_at(1), cookie.unlocks[0]);
        assert_eq!(cookie.unlock_at(10), cookie.unlocks[0]);
        assert_eq!(cookie.unlock_at(11), cookie.unlocks[1]);
        assert_eq!(cookie.unlock_at(21), cookie.unlocks[2]);
        assert_eq!(cookie.stats_at(0), Stats::default());
        assert_eq!(cookie.stats_at(30).health, 240.0);
    }

    #[test]
    fn test_short_progression_rejected() {
        let mut data = Catalog::builtin().data().clone();
        data.items[0].progression.pop();
        let err = Catalog::new(data).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut data = Catalog::builtin().data().clone();
        let copy = data.items[0].clone();
        data.items.push(copy);
        assert!(matches!(
            Catalog::new(data),
            Err(CatalogError::Duplicate { kind: "item", .. })
        ));
    }

    #[test]
    fn test_json_file_roundtrip() {
        let json = serde_json::to_string(Catalog::builtin().data()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = Catalog::load(file.path()).unwrap();
        assert_eq!(loaded.items().len(), Catalog::builtin().items().len());
        // Capabilities are not serialized and must be recomputed on load.
        assert!(loaded.lookup_item("AeosCookie").unwrap().capabilities().stacks);
    }

    #[test]
    fn test_ability_line_progression() {
        let catalog = Catalog::builtin();
        let cramorant = catalog.lookup_character("Cramorant").unwrap();
        let line = &cramorant.lines[0];
        assert!(line.move_at(0, 0).is_none());
        assert_eq!(line.move_at(line.choose_level - 1, 0), Some(&line.starter));
        let surf = line.position("Surf").unwrap();
        assert_eq!(line.move_at(line.choose_level, surf).unwrap().name, "Surf");
        let dive = line.position("Dive").unwrap();
        assert_eq!(line.move_at(15, dive).unwrap().name, "Dive+");
        assert!(line.move_at(15, 9).is_none());
    }
}
