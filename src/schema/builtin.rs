//! Builtin catalog used by the CLI when no catalog file is given, and by tests.

use super::catalog::{
    AbilityChoice, AbilityLine, AttackType, Capabilities, Catalog, CatalogData, CharacterRecord,
    Effect, ItemPassive, ItemRecord, ModifierRecord, MoveRecord, Recipient, Role, Scaling,
    Upgrade,
};
use super::{Stat, Stats};

impl Catalog {
    /// Small catalog with two characters, the common held items and a few modifiers.
    pub fn builtin() -> Self {
        let data = CatalogData {
            characters: vec![cramorant(), absol()],
            items: items(),
            modifiers: modifiers(),
        };
        Catalog::new(data).expect("builtin catalog data is well formed")
    }
}

// ----------------------------------------------------------------------------
// Progression helpers
// ----------------------------------------------------------------------------

const LEVELS: std::ops::RangeInclusive<u8> = 1..=30;

/// `step × level`.
fn linear(stat: Stat, step: f64) -> Vec<Stats> {
    LEVELS
        .map(|l| Stats::with(stat, step * f64::from(l)))
        .collect()
}

/// `base + step × level`.
fn offset(stat: Stat, base: f64, step: f64) -> Vec<Stats> {
    LEVELS
        .map(|l| Stats::with(stat, base + step * f64::from(l)))
        .collect()
}

/// Two stats growing on alternating levels: the first on odd levels, the
/// second on even levels.
fn alternating(first: (Stat, f64, f64), second: (Stat, f64, f64)) -> Vec<Stats> {
    LEVELS
        .map(|l| {
            let odd = f64::from(l.div_ceil(2));
            let even = f64::from(l / 2);
            Stats::with(first.0, first.1 + first.2 * odd)
                + Stats::with(second.0, second.1 + second.2 * even)
        })
        .collect()
}

fn item(
    name: &str,
    progression: Vec<Stats>,
    unlocks: [f64; 3],
    passive: ItemPassive,
    affinity: Option<AttackType>,
) -> ItemRecord {
    ItemRecord::new(name, progression, unlocks, passive, affinity)
}

fn items() -> Vec<ItemRecord> {
    use AttackType::{Physical, Special};
    use ItemPassive::{BaseStatPercent, None as Plain, StackScaling};
    use Stat::*;

    vec![
        item(
            "AeosCookie",
            linear(Health, 8.0),
            [100.0, 150.0, 200.0],
            StackScaling { stat: Health },
            None,
        ),
        item(
            "AssaultVest",
            alternating((Health, 0.0, 18.0), (SpDefense, 0.0, 2.8)),
            [0.09, 0.12, 0.15],
            Plain,
            None,
        ),
        item(
            "AttackWeight",
            linear(Attack, 0.6),
            [6.0, 9.0, 12.0],
            StackScaling { stat: Attack },
            Some(Physical),
        ),
        item(
            "BuddyBarrier",
            linear(Health, 20.0),
            [0.2, 0.3, 0.4],
            Plain,
            None,
        ),
        item(
            "ChoiceSpecs",
            offset(SpAttack, 9.0, 1.0),
            [40.0, 50.0, 60.0],
            Plain,
            Some(Special),
        ),
        item(
            "EnergyAmplifier",
            alternating((Charge, 0.0, 0.004), (Cdr, 0.0, 0.003)),
            [0.07, 0.14, 0.21],
            Plain,
            None,
        ),
        item(
            "ExpShare",
            alternating((Health, 0.0, 16.0), (Movement, 0.0, 10.0)),
            [2.0, 3.0, 4.0],
            Plain,
            None,
        ),
        item(
            "FloatStone",
            alternating((Attack, 0.0, 1.6), (Movement, 0.0, 8.0)),
            [0.10, 0.15, 0.20],
            BaseStatPercent { stat: Movement },
            Some(Physical),
        ),
        item(
            "FocusBand",
            alternating((SpDefense, 0.0, 2.0), (Defense, 0.0, 2.0)),
            [0.08, 0.11, 0.14],
            Plain,
            None,
        ),
        item(
            "Leftovers",
            alternating((Health, 0.0, 16.0), (Recovery, 0.0, 0.6)),
            [0.01, 0.015, 0.02],
            Plain,
            None,
        ),
        item(
            "MuscleBand",
            alternating((Attack, 0.0, 1.0), (Aps, 0.0, 0.5)),
            [0.01, 0.02, 0.03],
            Plain,
            Some(Physical),
        ),
        item(
            "RazorClaw",
            alternating((Attack, 0.0, 1.0), (CritRate, 0.006, 0.001)),
            [10.0, 15.0, 20.0],
            Plain,
            Some(Physical),
        ),
        item(
            "RockyHelmet",
            alternating((Health, 0.0, 18.0), (Defense, 0.0, 2.8)),
            [0.03, 0.04, 0.05],
            Plain,
            None,
        ),
        item(
            "ScopeLens",
            alternating((CritRate, 0.0, 0.004), (CritDamage, 0.0, 0.008)),
            [0.45, 0.6, 0.75],
            Plain,
            Some(Physical),
        ),
        item(
            "ScoreShield",
            linear(Health, 15.0),
            [0.05, 0.075, 0.1],
            Plain,
            None,
        ),
        item(
            "ShellBell",
            alternating((SpAttack, 0.0, 1.6), (Cdr, 0.0, 0.003)),
            [45.0, 60.0, 75.0],
            Plain,
            Some(Special),
        ),
        item(
            "SpAtkSpecs",
            linear(SpAttack, 0.8),
            [8.0, 12.0, 16.0],
            StackScaling { stat: SpAttack },
            Some(Special),
        ),
        item(
            "WeaknessPolicy",
            alternating((Health, 60.0, 10.0), (Attack, 0.0, 1.0)),
            [0.02, 0.025, 0.03],
            Plain,
            Some(Physical),
        ),
        item(
            "WiseGlasses",
            offset(SpAttack, 9.0, 1.0),
            [0.03, 0.05, 0.07],
            BaseStatPercent { stat: SpAttack },
            Some(Special),
        ),
    ]
}

fn modifier(name: &str, families: &[&str], stats: Stats) -> ModifierRecord {
    ModifierRecord {
        name: name.to_string(),
        families: families.iter().map(|f| f.to_string()).collect(),
        stats,
    }
}

fn modifiers() -> Vec<ModifierRecord> {
    use Stat::*;

    let pair = |up: (Stat, f64), down: (Stat, f64)| {
        Stats::with(up.0, up.1) + Stats::with(down.0, down.1)
    };

    vec![
        modifier("FlameFang", &["red"], pair((Attack, 1.2), (SpDefense, -1.6))),
        modifier("EmberScale", &["red", "white"], pair((Health, 30.0), (SpAttack, -1.2))),
        modifier("TideGem", &["blue"], pair((Defense, 2.0), (Movement, -21.0))),
        modifier("StoneShell", &["brown", "blue"], pair((Health, 30.0), (Attack, -1.2))),
        modifier("SparkOrb", &["yellow"], pair((SpAttack, 1.2), (Defense, -1.6))),
        modifier("VoltTail", &["yellow", "green"], pair((Movement, 21.0), (Health, -15.0))),
        modifier("LeafBlade", &["green"], pair((SpAttack, 1.6), (SpDefense, -2.0))),
        modifier("ShadowClaw", &["black"], pair((CritRate, 0.003), (Defense, -2.0))),
        modifier("GlimmerDust", &["pink"], pair((Cdr, 0.003), (Health, -15.0))),
    ]
}

// ----------------------------------------------------------------------------
// Characters
// ----------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn row(
    health: f64,
    attack: f64,
    defense: f64,
    spattack: f64,
    spdefense: f64,
    critrate: f64,
    aps: f64,
    cdr: f64,
) -> Stats {
    Stats {
        health,
        attack,
        defense,
        spattack,
        spdefense,
        critrate,
        aps,
        cdr,
        ..Default::default()
    }
}

fn damaging(attack: f64, spattack: f64, per_level: f64, flat: f64) -> Effect {
    Effect::Damaging {
        scaling: Scaling {
            attack,
            spattack,
            per_level,
            flat,
        },
    }
}

fn named(name: &str, cooldown: f64, effect: Effect) -> MoveRecord {
    MoveRecord {
        name: name.to_string(),
        cooldown,
        effect,
    }
}

fn choice(name: &str, base: MoveRecord, upgrade: Option<(u8, MoveRecord)>) -> AbilityChoice {
    AbilityChoice {
        name: name.to_string(),
        base,
        upgrade: upgrade.map(|(level, record)| Upgrade { level, record }),
    }
}

fn cramorant() -> CharacterRecord {
    let whirlpool = Effect::Combo {
        hits: [
            (2, damaging(0.0, 0.24, 5.0, 100.0)),
            (2, damaging(0.0, 0.27, 6.0, 110.0)),
            (6, damaging(0.0, 0.30, 7.0, 120.0)),
        ]
        .into_iter()
        .flat_map(|(n, hit)| std::iter::repeat_n(hit, n))
        .collect(),
    };
    let blade = damaging(0.0, 0.35, 6.0, 150.0);
    let gust_heal = Effect::Healing {
        scaling: Scaling {
            spattack: 0.3,
            flat: 60.0,
            ..Default::default()
        },
        recipient: Recipient::User,
    };

    CharacterRecord {
        name: "Cramorant".to_string(),
        attack_type: AttackType::Special,
        role: Role::Attacker,
        progression: vec![
            row(3292.0, 134.0, 60.0, 50.0, 40.0, 0.0, 0.0, 0.0),
            row(3399.0, 139.0, 69.0, 75.0, 46.0, 0.0, 0.0, 0.0),
            row(3517.0, 145.0, 78.0, 102.0, 52.0, 0.0, 0.0, 0.0),
            row(3647.0, 151.0, 88.0, 132.0, 59.0, 0.0, 0.0, 0.0),
            row(3789.0, 158.0, 99.0, 165.0, 67.0, 0.0, 0.0, 0.05),
            row(3946.0, 166.0, 112.0, 201.0, 75.0, 0.0, 0.0, 0.05),
            row(4118.0, 175.0, 126.0, 240.0, 84.0, 0.0, 0.0, 0.05),
            row(4308.0, 185.0, 141.0, 283.0, 94.0, 0.0, 0.0, 0.05),
            row(4517.0, 196.0, 158.0, 331.0, 105.0, 0.0, 0.0, 0.15),
            row(4748.0, 208.0, 176.0, 384.0, 117.0, 0.0, 0.0, 0.15),
            row(5002.0, 221.0, 196.0, 442.0, 131.0, 0.0, 0.0, 0.15),
            row(5281.0, 235.0, 218.0, 506.0, 146.0, 0.0, 0.0, 0.15),
            row(5589.0, 250.0, 243.0, 576.0, 162.0, 0.0, 0.0, 0.25),
            row(5928.0, 267.0, 270.0, 654.0, 180.0, 0.0, 0.0, 0.25),
            row(6301.0, 286.0, 300.0, 739.0, 200.0, 0.0, 0.0, 0.25),
        ],
        attacks_per_second: 0.95,
        basic: named("Basic", 0.0, damaging(1.0, 0.0, 0.0, 0.0)),
        boosted: named("Boosted", 0.0, damaging(0.0, 0.76, 16.0, 290.0)),
        boosted_every: 4,
        lines: [
            AbilityLine {
                unlock_level: 1,
                choose_level: 4,
                starter: named("Whirlpool", 5.0, whirlpool),
                choices: vec![
                    choice(
                        "Surf",
                        named(
                            "Surf",
                            8.0,
                            Effect::Combo {
                                hits: vec![
                                    damaging(0.0, 0.68, 9.0, 360.0),
                                    damaging(0.0, 1.02, 14.0, 540.0),
                                ],
                            },
                        ),
                        None,
                    ),
                    choice(
                        "Dive",
                        named("Dive", 4.5, damaging(0.0, 0.78, 14.0, 320.0)),
                        Some((11, named("Dive+", 4.5, damaging(0.0, 0.86, 16.0, 360.0)))),
                    ),
                ],
            },
            AbilityLine {
                unlock_level: 1,
                choose_level: 6,
                starter: named(
                    "FeatherDance",
                    8.0,
                    Effect::Status {
                        duration: 2.0,
                        stats: Stats {
                            aps: -30.0,
                            movement: -20.0,
                            ..Default::default()
                        },
                    },
                ),
                choices: vec![
                    choice(
                        "Hurricane",
                        named("Hurricane", 9.0, damaging(0.0, 1.03, 10.0, 540.0)),
                        None,
                    ),
                    choice(
                        "AirSlash",
                        named(
                            "AirSlash",
                            5.0,
                            Effect::Combo {
                                hits: vec![blade.clone(); 4],
                            },
                        ),
                        Some((
                            13,
                            named(
                                "AirSlash+",
                                5.0,
                                Effect::Combo {
                                    hits: std::iter::repeat_n(blade, 4)
                                        .chain(std::iter::repeat_n(gust_heal, 4))
                                        .collect(),
                                },
                            ),
                        )),
                    ),
                ],
            },
        ],
        stack_bonus: None,
        capabilities: Capabilities::NONE,
    }
}

fn absol() -> CharacterRecord {
    // Columns: health, attack, defense, spattack, spdefense, crit rate,
    // attack speed bonus (%).
    let table: [(f64, f64, f64, f64, f64, f64, f64); 15] = [
        (3000.0, 170.0, 52.0, 20.0, 36.0, 0.00, 0.0),
        (3107.0, 186.0, 59.0, 23.0, 41.0, 0.00, 1.8),
        (3224.0, 204.0, 67.0, 27.0, 47.0, 0.00, 3.6),
        (3353.0, 223.0, 76.0, 31.0, 53.0, 0.00, 5.4),
        (3495.0, 244.0, 86.0, 36.0, 60.0, 0.05, 7.2),
        (3651.0, 267.0, 97.0, 41.0, 68.0, 0.05, 9.0),
        (3823.0, 293.0, 109.0, 47.0, 76.0, 0.05, 10.8),
        (4012.0, 321.0, 122.0, 53.0, 85.0, 0.05, 12.6),
        (4221.0, 352.0, 136.0, 60.0, 95.0, 0.10, 14.4),
        (4451.0, 387.0, 152.0, 58.0, 106.0, 0.10, 16.2),
        (4704.0, 425.0, 170.0, 76.0, 118.0, 0.10, 18.0),
        (4983.0, 467.0, 189.0, 85.0, 131.0, 0.10, 19.8),
        (5290.0, 513.0, 210.0, 95.0, 146.0, 0.10, 21.6),
        (5628.0, 564.0, 233.0, 106.0, 162.0, 0.10, 23.4),
        (6000.0, 620.0, 259.0, 118.0, 180.0, 0.10, 25.2),
    ];
    let progression = table
        .iter()
        .map(|&(hp, atk, def, spa, spd, crit, aps)| row(hp, atk, def, spa, spd, crit, aps, 0.0))
        .collect();

    let cut = damaging(0.57, 0.0, 5.0, 110.0);
    let cut_plus = damaging(0.62, 0.0, 6.0, 120.0);
    let guard = |attack: f64, flat: f64| Effect::Shielding {
        scaling: Scaling {
            attack,
            flat,
            ..Default::default()
        },
        recipient: Recipient::User,
    };

    CharacterRecord {
        name: "Absol".to_string(),
        attack_type: AttackType::Physical,
        role: Role::Speedster,
        progression,
        attacks_per_second: 1.0,
        basic: named("Basic", 0.0, damaging(1.0, 0.0, 0.0, 0.0)),
        boosted: named("Boosted", 0.0, damaging(1.3, 0.0, 0.0, 0.0)),
        boosted_every: 3,
        lines: [
            AbilityLine {
                unlock_level: 1,
                choose_level: 5,
                starter: named("Feint", 6.0, damaging(0.95, 0.0, 8.0, 180.0)),
                choices: vec![
                    choice(
                        "PsychoCut",
                        named(
                            "PsychoCut",
                            6.5,
                            Effect::Combo {
                                hits: vec![cut; 3],
                            },
                        ),
                        Some((
                            11,
                            named(
                                "PsychoCut+",
                                6.5,
                                Effect::Combo {
                                    hits: vec![cut_plus; 3],
                                },
                            ),
                        )),
                    ),
                    choice(
                        "Pursuit",
                        named("Pursuit", 7.5, damaging(1.73, 0.0, 18.0, 380.0)),
                        Some((11, named("Pursuit+", 7.5, damaging(1.9, 0.0, 20.0, 420.0)))),
                    ),
                ],
            },
            AbilityLine {
                unlock_level: 3,
                choose_level: 7,
                starter: named("Swift", 5.0, damaging(0.7, 0.0, 4.0, 90.0)),
                choices: vec![
                    choice(
                        "NightSlash",
                        named("NightSlash", 5.0, damaging(1.22, 0.0, 13.0, 280.0)),
                        Some((
                            13,
                            named("NightSlash+", 4.5, damaging(1.33, 0.0, 14.0, 300.0)),
                        )),
                    ),
                    choice(
                        "SuckerPunch",
                        named(
                            "SuckerPunch",
                            9.0,
                            Effect::Combo {
                                hits: vec![damaging(1.55, 0.0, 14.0, 310.0), guard(0.6, 100.0)],
                            },
                        ),
                        Some((
                            13,
                            named(
                                "SuckerPunch+",
                                8.0,
                                Effect::Combo {
                                    hits: vec![
                                        damaging(1.7, 0.0, 15.0, 340.0),
                                        guard(0.8, 140.0),
                                    ],
                                },
                            ),
                        )),
                    ),
                ],
            },
        ],
        stack_bonus: None,
        capabilities: Capabilities::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternating_progression() {
        let vest = alternating((Stat::Health, 0.0, 18.0), (Stat::SpDefense, 0.0, 2.8));
        assert_eq!(vest.len(), 30);
        assert_eq!(vest[0].health, 18.0);
        assert_eq!(vest[0].spdefense, 0.0);
        assert_eq!(vest[1].health, 18.0);
        assert!((vest[1].spdefense - 2.8).abs() < 1e-9);
        assert_eq!(vest[29].health, 270.0);
        assert!((vest[29].spdefense - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_progression() {
        let specs = offset(Stat::SpAttack, 9.0, 1.0);
        assert_eq!(specs[0].spattack, 10.0);
        assert_eq!(specs[29].spattack, 39.0);
    }

    #[test]
    fn test_builtin_characters_complete() {
        let catalog = Catalog::builtin();
        for character in catalog.characters() {
            assert_eq!(character.progression.len(), 15);
            for line in &character.lines {
                assert_eq!(line.choices.len(), 2);
            }
        }
    }
}
