//! Baseline-relative fitness for ranked searches.

use crate::schema::{CHARACTER_MAX_LEVEL, LevelWeighting, Role, SearchError, WeightProfile};

use crate::compute::metrics::LevelRecord;

/// Each sort key outweighs the next by this factor.
pub const PRIORITY_FACTOR: f64 = 4.0;

/// Level the `mid` profile peaks at.
const MID_PEAK: u8 = 8;

impl WeightProfile {
    pub fn weight(self, level: u8) -> f64 {
        let level = f64::from(level);
        match self {
            WeightProfile::Flat => 1.0,
            WeightProfile::Early => f64::from(CHARACTER_MAX_LEVEL) + 1.0 - level,
            WeightProfile::Late => level,
            WeightProfile::Mid => f64::from(MID_PEAK) - (level - f64::from(MID_PEAK)).abs(),
        }
    }

    /// Default profile for a character role.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Attacker => WeightProfile::Late,
            Role::Speedster => WeightProfile::Early,
            Role::Defender | Role::Supporter => WeightProfile::Flat,
            Role::AllRounder => WeightProfile::Mid,
        }
    }
}

/// One weight per requested level, with the precomputed total.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelWeights {
    weights: Vec<f64>,
    total: f64,
}

impl LevelWeights {
    pub fn new(levels: &[u8], weighting: &LevelWeighting) -> Result<Self, SearchError> {
        let weights = match weighting {
            LevelWeighting::Profile(profile) => {
                levels.iter().map(|&level| profile.weight(level)).collect()
            }
            LevelWeighting::Explicit(weights) => {
                if weights.len() != levels.len() {
                    return Err(SearchError::InvalidOption {
                        option: "weights",
                        reason: format!(
                            "{} weights given for {} levels",
                            weights.len(),
                            levels.len()
                        ),
                    });
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(SearchError::InvalidOption {
                        option: "weights",
                        reason: "weights must be finite and non-negative".to_string(),
                    });
                }
                weights.clone()
            }
        };

        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(SearchError::InvalidOption {
                option: "weights",
                reason: "weights must sum to a finite positive value".to_string(),
            });
        }
        Ok(Self { weights, total })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Relative change of `candidate` over `baseline`.
///
/// A zero baseline gives 0 for a zero candidate and the candidate's sign
/// otherwise.
pub fn deviation(candidate: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        if candidate == 0.0 {
            0.0
        } else {
            candidate.signum()
        }
    } else {
        (candidate - baseline) / baseline
    }
}

/// Scores per-level records against a baseline.
#[derive(Debug, Clone)]
pub struct FitnessRanker {
    sort_keys: Vec<String>,
    weights: LevelWeights,
}

impl FitnessRanker {
    pub fn new(sort_keys: Vec<String>, weights: LevelWeights) -> Self {
        Self { sort_keys, weights }
    }

    pub fn sort_keys(&self) -> &[String] {
        &self.sort_keys
    }

    /// Fold every sort key's weighted mean deviation into one scalar, the
    /// first key dominating.
    pub fn score(&self, candidate: &[LevelRecord], baseline: &[LevelRecord]) -> f64 {
        let mut fitness = 0.0;
        for key in &self.sort_keys {
            let weighted: f64 = candidate
                .iter()
                .zip(baseline)
                .zip(self.weights.weights())
                .map(|((c, b), w)| {
                    let value = c.get(key).unwrap_or(0.0);
                    let base = b.get(key).unwrap_or(0.0);
                    deviation(value, base) * w
                })
                .sum();
            let contribution = weighted / self.weights.total();
            fitness = fitness * PRIORITY_FACTOR + contribution;
        }
        fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: u8, pairs: &[(&str, f64)]) -> LevelRecord {
        let mut record = LevelRecord::new(level);
        for (name, value) in pairs {
            record.values.insert(name.to_string(), *value);
        }
        record
    }

    #[test]
    fn test_deviation() {
        assert_eq!(deviation(150.0, 100.0), 0.5);
        assert_eq!(deviation(50.0, 100.0), -0.5);
        assert_eq!(deviation(0.0, 0.0), 0.0);
        assert_eq!(deviation(3.0, 0.0), 1.0);
        assert_eq!(deviation(-3.0, 0.0), -1.0);
    }

    #[test]
    fn test_profiles() {
        assert_eq!(WeightProfile::Early.weight(1), 15.0);
        assert_eq!(WeightProfile::Early.weight(15), 1.0);
        assert_eq!(WeightProfile::Late.weight(15), 15.0);
        assert_eq!(WeightProfile::Mid.weight(8), 8.0);
        assert_eq!(WeightProfile::Mid.weight(1), 1.0);
        assert_eq!(WeightProfile::Mid.weight(15), 1.0);
        assert_eq!(WeightProfile::Flat.weight(7), 1.0);
        assert_eq!(WeightProfile::for_role(Role::Attacker), WeightProfile::Late);
    }

    #[test]
    fn test_explicit_weights_validated() {
        let levels = [5, 6];
        assert!(LevelWeights::new(&levels, &LevelWeighting::Explicit(vec![1.0])).is_err());
        assert!(LevelWeights::new(&levels, &LevelWeighting::Explicit(vec![0.0, 0.0])).is_err());
        assert!(LevelWeights::new(&levels, &LevelWeighting::Explicit(vec![1.0, -1.0])).is_err());
        let overflow = LevelWeighting::Explicit(vec![f64::MAX, f64::MAX]);
        assert!(LevelWeights::new(&levels, &overflow).is_err());

        let weights =
            LevelWeights::new(&levels, &LevelWeighting::Explicit(vec![1.0, 3.0])).unwrap();
        assert_eq!(weights.total(), 4.0);
    }

    #[test]
    fn test_weighted_mean_deviation() {
        let levels = [1, 2];
        let weights =
            LevelWeights::new(&levels, &LevelWeighting::Explicit(vec![1.0, 3.0])).unwrap();
        let ranker = FitnessRanker::new(vec!["dps".to_string()], weights);

        let baseline = [record(1, &[("dps", 100.0)]), record(2, &[("dps", 100.0)])];
        let candidate = [record(1, &[("dps", 200.0)]), record(2, &[("dps", 100.0)])];
        // (1.0 * 1 + 0.0 * 3) / 4
        assert_eq!(ranker.score(&candidate, &baseline), 0.25);
    }

    #[test]
    fn test_priority_factor() {
        let levels = [1];
        let weights =
            LevelWeights::new(&levels, &LevelWeighting::Profile(WeightProfile::Flat)).unwrap();
        let ranker = FitnessRanker::new(vec!["dps".to_string(), "ehp".to_string()], weights);

        let baseline = [record(1, &[("dps", 100.0), ("ehp", 100.0)])];
        let candidate = [record(1, &[("dps", 150.0), ("ehp", 110.0)])];
        let score = ranker.score(&candidate, &baseline);
        assert!((score - (0.5 * 4.0 + 0.1)).abs() < 1e-12);
    }
}
