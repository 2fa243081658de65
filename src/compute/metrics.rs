//! Named performance metrics with prerequisites, resolved lazily against one
//! build and memoized in a per-level record.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::schema::{CritMode, NameKind, SearchError, Stat, Target};

use super::build::{Action, BuildInstance};

/// Metric values for one candidate at one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelRecord {
    pub level: u8,
    pub values: BTreeMap<String, f64>,
}

impl LevelRecord {
    pub fn new(level: u8) -> Self {
        Self {
            level,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// Evaluation parameters shared by every metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalParams {
    pub crit: CritMode,
}

/// What a metric's compute function sees.
pub struct MetricInputs<'r> {
    pub level: u8,
    pub values: &'r BTreeMap<String, f64>,
    pub build: &'r dyn BuildInstance,
    pub enemy: Option<&'r Target>,
    pub params: &'r EvalParams,
}

impl MetricInputs<'_> {
    /// Value of an already resolved prerequisite.
    pub fn value(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Outcome of `action` against the configured enemy.
    pub fn outcome(&self, action: Action) -> super::build::PointStore {
        self.build.outcome(action, self.enemy, self.params.crit)
    }
}

pub type MetricFn = Box<dyn Fn(&MetricInputs<'_>) -> f64>;

struct Metric {
    prerequisites: Vec<String>,
    compute: MetricFn,
}

/// Registry of metric definitions and named metric groups.
#[derive(Default)]
pub struct MetricGraph {
    metrics: HashMap<String, Metric>,
    groups: HashMap<String, Vec<String>>,
}

impl fmt::Debug for MetricGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        f.debug_struct("MetricGraph")
            .field("metrics", &names)
            .field("groups", &self.groups)
            .finish()
    }
}

impl MetricGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name`. Re-registering replaces the previous definition.
    pub fn register<F>(&mut self, name: impl Into<String>, prerequisites: &[&str], compute: F)
    where
        F: Fn(&MetricInputs<'_>) -> f64 + 'static,
    {
        let name = name.into();
        let metric = Metric {
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            compute: Box::new(compute),
        };
        if self.metrics.insert(name.clone(), metric).is_some() {
            log::warn!("Metric {} redefined", name);
        }
    }

    /// Define a show group that expands to `members`.
    pub fn register_group(&mut self, name: impl Into<String>, members: Vec<String>) {
        self.groups.insert(name.into(), members);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Expand groups and check every name, keeping first occurrences in order.
    pub fn expand(&self, names: &[String]) -> Result<Vec<String>, SearchError> {
        let mut out: Vec<String> = Vec::new();
        let push = |name: &String, out: &mut Vec<String>| {
            if !out.contains(name) {
                out.push(name.clone());
            }
        };

        for name in names {
            if let Some(members) = self.groups.get(name) {
                for member in members {
                    push(member, &mut out);
                }
            } else if self.contains(name) {
                push(name, &mut out);
            } else {
                return Err(SearchError::UnknownName {
                    kind: NameKind::Metric,
                    name: name.clone(),
                });
            }
        }
        Ok(out)
    }

    /// Ensure `record` holds `name`, resolving prerequisites first.
    ///
    /// Values already in the record are never recomputed.
    pub fn evaluate(
        &self,
        record: &mut LevelRecord,
        build: &dyn BuildInstance,
        enemy: Option<&Target>,
        params: &EvalParams,
        name: &str,
    ) -> Result<f64, SearchError> {
        let mut resolving = Vec::new();
        self.resolve(record, build, enemy, params, name, &mut resolving)
    }

    fn resolve(
        &self,
        record: &mut LevelRecord,
        build: &dyn BuildInstance,
        enemy: Option<&Target>,
        params: &EvalParams,
        name: &str,
        resolving: &mut Vec<String>,
    ) -> Result<f64, SearchError> {
        if let Some(value) = record.get(name) {
            return Ok(value);
        }
        let metric = self
            .metrics
            .get(name)
            .ok_or_else(|| SearchError::UnknownName {
                kind: NameKind::Metric,
                name: name.to_string(),
            })?;

        if let Some(start) = resolving.iter().position(|n| n == name) {
            let mut path = resolving[start..].to_vec();
            path.push(name.to_string());
            return Err(SearchError::MetricCycle(path));
        }

        resolving.push(name.to_string());
        for prerequisite in &metric.prerequisites {
            self.resolve(record, build, enemy, params, prerequisite, resolving)?;
        }
        resolving.pop();

        let value = (metric.compute)(&MetricInputs {
            level: record.level,
            values: &record.values,
            build,
            enemy,
            params,
        });
        record.values.insert(name.to_string(), value);
        Ok(value)
    }

    /// Stat metrics, defensive and offensive figures, and the `stats` group.
    pub fn standard() -> Self {
        let mut graph = Self::new();

        for stat in Stat::ALL {
            graph.register(stat.name(), &[], move |m| m.build.stats().get(stat));
        }
        graph.register_group(
            "stats",
            Stat::ALL.iter().map(|s| s.name().to_string()).collect(),
        );

        graph.register("physhp", &["health", "defense"], |m| {
            effective_health(m.value("health"), m.value("defense"))
        });
        graph.register("spechp", &["health", "spdefense"], |m| {
            effective_health(m.value("health"), m.value("spdefense"))
        });
        graph.register("ehp", &["physhp", "spechp"], |m| {
            (m.value("physhp") + m.value("spechp")) / 2.0
        });

        graph.register("attack_rate", &["aps"], |m| {
            m.build.attacks_per_second() * (1.0 + m.value("aps") / 100.0)
        });
        graph.register("basic", &[], |m| m.outcome(Action::Basic).damage);
        graph.register("boosted", &[], |m| m.outcome(Action::Boosted).damage);
        graph.register("autos", &["basic", "boosted", "attack_rate"], |m| {
            let every = f64::from(m.build.boosted_every().max(1));
            let per_attack = ((every - 1.0) * m.value("basic") + m.value("boosted")) / every;
            per_attack * m.value("attack_rate")
        });

        for line in 0..2 {
            let name = format!("ability{}", line + 1);
            let cd = format!("{}_cd", name);
            let dps = format!("{}_dps", name);

            graph.register(name.clone(), &[], move |m| {
                m.outcome(Action::Ability(line)).damage
            });
            graph.register(cd.clone(), &["cdr"], move |m| {
                m.build.cooldown(Action::Ability(line)) * (1.0 - m.value("cdr").clamp(0.0, 1.0))
            });
            let (damage_key, cd_key) = (name.clone(), cd.clone());
            graph.register(dps, &[name.as_str(), cd.as_str()], move |m| {
                let cooldown = m.value(&cd_key);
                if cooldown > 0.0 {
                    m.value(&damage_key) / cooldown
                } else {
                    0.0
                }
            });
        }

        graph.register("dps", &["autos", "ability1_dps", "ability2_dps"], |m| {
            m.value("autos") + m.value("ability1_dps") + m.value("ability2_dps")
        });
        graph.register("healing", &[], |m| {
            (0..2)
                .map(|line| m.outcome(Action::Ability(line)).healing())
                .sum()
        });
        graph.register("shielding", &[], |m| {
            (0..2)
                .map(|line| m.outcome(Action::Ability(line)).shielding())
                .sum()
        });

        graph
    }
}

/// Health needed to absorb damage through `defense`.
fn effective_health(health: f64, defense: f64) -> f64 {
    (health / super::build::mitigation(defense)).floor()
}
