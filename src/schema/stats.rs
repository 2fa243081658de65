//! Stat vectors shared by characters, items and modifiers.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{NameKind, SearchError};

/// A single named stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Health,
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    /// Crit chance as a fraction (0.1 = 10%).
    CritRate,
    /// Bonus crit damage on top of the base crit multiplier.
    CritDamage,
    /// Attack speed bonus in percent.
    Aps,
    /// Cooldown reduction as a fraction.
    Cdr,
    Lifesteal,
    Charge,
    Movement,
    Recovery,
}

impl Stat {
    /// Every stat, in display order.
    pub const ALL: [Stat; 13] = [
        Stat::Health,
        Stat::Attack,
        Stat::Defense,
        Stat::SpAttack,
        Stat::SpDefense,
        Stat::CritRate,
        Stat::CritDamage,
        Stat::Aps,
        Stat::Cdr,
        Stat::Lifesteal,
        Stat::Charge,
        Stat::Movement,
        Stat::Recovery,
    ];

    /// Lowercase name, identical to the serialized form and the metric name.
    pub fn name(self) -> &'static str {
        match self {
            Stat::Health => "health",
            Stat::Attack => "attack",
            Stat::Defense => "defense",
            Stat::SpAttack => "spattack",
            Stat::SpDefense => "spdefense",
            Stat::CritRate => "critrate",
            Stat::CritDamage => "critdamage",
            Stat::Aps => "aps",
            Stat::Cdr => "cdr",
            Stat::Lifesteal => "lifesteal",
            Stat::Charge => "charge",
            Stat::Movement => "movement",
            Stat::Recovery => "recovery",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stat {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::ALL
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| SearchError::UnknownName {
                kind: NameKind::Stat,
                name: s.to_string(),
            })
    }
}

/// A full stat vector. Missing fields deserialize as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub health: f64,
    pub attack: f64,
    pub defense: f64,
    pub spattack: f64,
    pub spdefense: f64,
    pub critrate: f64,
    pub critdamage: f64,
    pub aps: f64,
    pub cdr: f64,
    pub lifesteal: f64,
    pub charge: f64,
    pub movement: f64,
    pub recovery: f64,
}

impl Stats {
    /// A vector with a single non-zero stat.
    pub fn with(stat: Stat, value: f64) -> Self {
        let mut stats = Self::default();
        *stats.get_mut(stat) = value;
        stats
    }

    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Health => self.health,
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::SpAttack => self.spattack,
            Stat::SpDefense => self.spdefense,
            Stat::CritRate => self.critrate,
            Stat::CritDamage => self.critdamage,
            Stat::Aps => self.aps,
            Stat::Cdr => self.cdr,
            Stat::Lifesteal => self.lifesteal,
            Stat::Charge => self.charge,
            Stat::Movement => self.movement,
            Stat::Recovery => self.recovery,
        }
    }

    pub fn get_mut(&mut self, stat: Stat) -> &mut f64 {
        match stat {
            Stat::Health => &mut self.health,
            Stat::Attack => &mut self.attack,
            Stat::Defense => &mut self.defense,
            Stat::SpAttack => &mut self.spattack,
            Stat::SpDefense => &mut self.spdefense,
            Stat::CritRate => &mut self.critrate,
            Stat::CritDamage => &mut self.critdamage,
            Stat::Aps => &mut self.aps,
            Stat::Cdr => &mut self.cdr,
            Stat::Lifesteal => &mut self.lifesteal,
            Stat::Charge => &mut self.charge,
            Stat::Movement => &mut self.movement,
            Stat::Recovery => &mut self.recovery,
        }
    }

    /// Every stat multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = *self;
        for stat in Stat::ALL {
            *out.get_mut(stat) *= factor;
        }
        out
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Self) {
        for stat in Stat::ALL {
            *self.get_mut(stat) += rhs.get(stat);
        }
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_names_roundtrip() {
        for stat in Stat::ALL {
            assert_eq!(stat.name().parse::<Stat>().unwrap(), stat);
        }
        assert!("speed".parse::<Stat>().is_err());
    }

    #[test]
    fn test_serde_name_matches_metric_name() {
        let json = serde_json::to_string(&Stat::SpAttack).unwrap();
        assert_eq!(json, "\"spattack\"");
    }

    #[test]
    fn test_add_and_scale() {
        let a = Stats::with(Stat::Attack, 10.0);
        let b = Stats {
            attack: 2.5,
            health: 100.0,
            ..Default::default()
        };
        let sum = a + b;
        assert_eq!(sum.attack, 12.5);
        assert_eq!(sum.health, 100.0);
        assert_eq!(sum.scaled(2.0).get(Stat::Health), 200.0);
    }

    #[test]
    fn test_partial_json_defaults_to_zero() {
        let stats: Stats = serde_json::from_str(r#"{"health": 8}"#).unwrap();
        assert_eq!(stats.health, 8.0);
        assert_eq!(stats.attack, 0.0);
    }
}
