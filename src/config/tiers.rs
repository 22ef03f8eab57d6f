use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{AnalyzerError, ChestTier, Result};

/// Closed score band `[min_score, max_score]` covered by a tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBand {
    pub min_score: f64,
    pub max_score: f64,
}

impl ScoreBand {
    pub fn contains(&self, score: f64) -> bool {
        self.min_score <= score && score <= self.max_score
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Reward-value ranges attached to a tier. Informational for this engine;
/// issuance happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardRanges {
    pub coins: ValueRange,
    pub bonus_multiplier: ValueRange,
    pub free_spins: ValueRange,
}

/// Minimum requirements gating a tier under the requirement-gated policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierRequirements {
    pub min_deposit: Decimal,
    pub min_bets: u32,
    pub min_ggr: Decimal,
    pub min_vip_level: u8,
}

/// Per-factor weights for the requirement-gated score. Must sum to ~1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RequirementWeights {
    pub deposit: f64,
    pub activity: f64,
    pub loyalty: f64,
    pub vip: f64,
}

impl RequirementWeights {
    pub fn total(&self) -> f64 {
        self.deposit + self.activity + self.loyalty + self.vip
    }
}

/// Full per-tier configuration. Carries both policy sections so a snapshot
/// serves either scoring policy; validated at refresh time so malformed
/// external data never reaches scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierConfig {
    pub tier: ChestTier,
    pub band: ScoreBand,
    pub rewards: RewardRanges,
    pub rarity_weights: BTreeMap<String, f64>,
    pub cost_multiplier: f64,
    pub requirements: TierRequirements,
    pub weights: RequirementWeights,
    pub base_probability: f64,
    pub max_reward_value: Decimal,
    /// Informational only; cooldown enforcement is a collaborator's job.
    pub cooldown_hours: u32,
    /// Informational only, like `cooldown_hours`.
    pub max_per_day: u32,
}

/// Raw wire shape served by the config source. Every field is optional;
/// missing fields fall back per-field to the emergency values when merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfigPayload {
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub rewards: Option<RewardRanges>,
    pub rarity_weights: Option<BTreeMap<String, f64>>,
    pub cost_multiplier: Option<f64>,
    pub min_deposit: Option<f64>,
    pub min_bets: Option<u32>,
    pub min_ggr: Option<f64>,
    pub min_vip_level: Option<u8>,
    pub weight_deposit: Option<f64>,
    pub weight_activity: Option<f64>,
    pub weight_loyalty: Option<f64>,
    pub weight_vip: Option<f64>,
    pub base_probability: Option<f64>,
    pub max_reward_value: Option<f64>,
    pub cooldown_hours: Option<u32>,
    pub max_per_day: Option<u32>,
}

fn decimal_or(value: Option<f64>, fallback: Decimal) -> Decimal {
    value
        .and_then(|v| Decimal::try_from(v).ok())
        .unwrap_or(fallback)
}

fn rarity_weights(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}

impl TierConfig {
    /// Hardcoded emergency configuration, used for any tier or field the
    /// external config source could not resolve.
    pub fn emergency(tier: ChestTier) -> Self {
        match tier {
            ChestTier::Bronze => TierConfig {
                tier,
                band: ScoreBand { min_score: 0.0, max_score: 20.0 },
                rewards: RewardRanges {
                    coins: ValueRange { min: 10.0, max: 50.0 },
                    bonus_multiplier: ValueRange { min: 1.1, max: 1.3 },
                    free_spins: ValueRange { min: 5.0, max: 15.0 },
                },
                rarity_weights: rarity_weights(&[("common", 0.7), ("rare", 0.25), ("epic", 0.05)]),
                cost_multiplier: 1.0,
                requirements: TierRequirements {
                    min_deposit: Decimal::from(10),
                    min_bets: 5,
                    min_ggr: Decimal::from(5),
                    min_vip_level: 0,
                },
                weights: RequirementWeights { deposit: 0.3, activity: 0.3, loyalty: 0.2, vip: 0.2 },
                base_probability: 0.8,
                max_reward_value: Decimal::from(50),
                cooldown_hours: 1,
                max_per_day: 10,
            },
            ChestTier::Silver => TierConfig {
                tier,
                band: ScoreBand { min_score: 20.0, max_score: 40.0 },
                rewards: RewardRanges {
                    coins: ValueRange { min: 50.0, max: 150.0 },
                    bonus_multiplier: ValueRange { min: 1.3, max: 1.6 },
                    free_spins: ValueRange { min: 15.0, max: 30.0 },
                },
                rarity_weights: rarity_weights(&[("common", 0.5), ("rare", 0.4), ("epic", 0.1)]),
                cost_multiplier: 1.5,
                requirements: TierRequirements {
                    min_deposit: Decimal::from(50),
                    min_bets: 20,
                    min_ggr: Decimal::from(25),
                    min_vip_level: 1,
                },
                weights: RequirementWeights { deposit: 0.35, activity: 0.25, loyalty: 0.25, vip: 0.15 },
                base_probability: 0.6,
                max_reward_value: Decimal::from(150),
                cooldown_hours: 2,
                max_per_day: 8,
            },
            ChestTier::Gold => TierConfig {
                tier,
                band: ScoreBand { min_score: 40.0, max_score: 65.0 },
                rewards: RewardRanges {
                    coins: ValueRange { min: 150.0, max: 400.0 },
                    bonus_multiplier: ValueRange { min: 1.6, max: 2.0 },
                    free_spins: ValueRange { min: 30.0, max: 60.0 },
                },
                rarity_weights: rarity_weights(&[("common", 0.3), ("rare", 0.5), ("epic", 0.2)]),
                cost_multiplier: 2.5,
                requirements: TierRequirements {
                    min_deposit: Decimal::from(200),
                    min_bets: 50,
                    min_ggr: Decimal::from(100),
                    min_vip_level: 2,
                },
                weights: RequirementWeights { deposit: 0.4, activity: 0.2, loyalty: 0.3, vip: 0.1 },
                base_probability: 0.4,
                max_reward_value: Decimal::from(500),
                cooldown_hours: 4,
                max_per_day: 5,
            },
            ChestTier::Platinum => TierConfig {
                tier,
                band: ScoreBand { min_score: 65.0, max_score: 85.0 },
                rewards: RewardRanges {
                    coins: ValueRange { min: 400.0, max: 1000.0 },
                    bonus_multiplier: ValueRange { min: 2.0, max: 3.0 },
                    free_spins: ValueRange { min: 60.0, max: 120.0 },
                },
                rarity_weights: rarity_weights(&[
                    ("common", 0.2),
                    ("rare", 0.5),
                    ("epic", 0.25),
                    ("legendary", 0.05),
                ]),
                cost_multiplier: 4.0,
                requirements: TierRequirements {
                    min_deposit: Decimal::from(1000),
                    min_bets: 100,
                    min_ggr: Decimal::from(500),
                    min_vip_level: 3,
                },
                weights: RequirementWeights { deposit: 0.5, activity: 0.15, loyalty: 0.25, vip: 0.1 },
                base_probability: 0.2,
                max_reward_value: Decimal::from(2000),
                cooldown_hours: 8,
                max_per_day: 3,
            },
            ChestTier::Diamond => TierConfig {
                tier,
                band: ScoreBand { min_score: 85.0, max_score: 100.0 },
                rewards: RewardRanges {
                    coins: ValueRange { min: 1000.0, max: 5000.0 },
                    bonus_multiplier: ValueRange { min: 3.0, max: 5.0 },
                    free_spins: ValueRange { min: 120.0, max: 300.0 },
                },
                rarity_weights: rarity_weights(&[
                    ("rare", 0.3),
                    ("epic", 0.4),
                    ("legendary", 0.25),
                    ("mythic", 0.05),
                ]),
                cost_multiplier: 8.0,
                requirements: TierRequirements {
                    min_deposit: Decimal::from(5000),
                    min_bets: 500,
                    min_ggr: Decimal::from(2500),
                    min_vip_level: 5,
                },
                weights: RequirementWeights { deposit: 0.6, activity: 0.1, loyalty: 0.2, vip: 0.1 },
                base_probability: 0.05,
                max_reward_value: Decimal::from(10000),
                cooldown_hours: 24,
                max_per_day: 1,
            },
        }
    }

    /// Merge a (possibly partial) payload over the emergency defaults.
    /// Missing or unparsable fields keep their emergency values.
    pub fn from_payload(tier: ChestTier, payload: TierConfigPayload) -> Self {
        let fallback = TierConfig::emergency(tier);

        TierConfig {
            tier,
            band: ScoreBand {
                min_score: payload.min_score.unwrap_or(fallback.band.min_score),
                max_score: payload.max_score.unwrap_or(fallback.band.max_score),
            },
            rewards: payload.rewards.unwrap_or(fallback.rewards),
            rarity_weights: payload.rarity_weights.unwrap_or(fallback.rarity_weights),
            cost_multiplier: payload.cost_multiplier.unwrap_or(fallback.cost_multiplier),
            requirements: TierRequirements {
                min_deposit: decimal_or(payload.min_deposit, fallback.requirements.min_deposit),
                min_bets: payload.min_bets.unwrap_or(fallback.requirements.min_bets),
                min_ggr: decimal_or(payload.min_ggr, fallback.requirements.min_ggr),
                min_vip_level: payload
                    .min_vip_level
                    .unwrap_or(fallback.requirements.min_vip_level),
            },
            weights: RequirementWeights {
                deposit: payload.weight_deposit.unwrap_or(fallback.weights.deposit),
                activity: payload.weight_activity.unwrap_or(fallback.weights.activity),
                loyalty: payload.weight_loyalty.unwrap_or(fallback.weights.loyalty),
                vip: payload.weight_vip.unwrap_or(fallback.weights.vip),
            },
            base_probability: payload.base_probability.unwrap_or(fallback.base_probability),
            max_reward_value: decimal_or(payload.max_reward_value, fallback.max_reward_value),
            cooldown_hours: payload.cooldown_hours.unwrap_or(fallback.cooldown_hours),
            max_per_day: payload.max_per_day.unwrap_or(fallback.max_per_day),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.band.min_score > self.band.max_score {
            return Err(AnalyzerError::ConfigError(format!(
                "{}: band min {} above max {}",
                self.tier.as_str(),
                self.band.min_score,
                self.band.max_score
            )));
        }
        if (self.weights.total() - 1.0).abs() > 0.01 {
            return Err(AnalyzerError::ConfigError(format!(
                "{}: requirement weights sum to {}, expected 1.0",
                self.tier.as_str(),
                self.weights.total()
            )));
        }
        if !(0.0..=1.0).contains(&self.base_probability) {
            return Err(AnalyzerError::ConfigError(format!(
                "{}: base_probability {} outside [0, 1]",
                self.tier.as_str(),
                self.base_probability
            )));
        }
        if self.max_reward_value < Decimal::ZERO {
            return Err(AnalyzerError::ConfigError(format!(
                "{}: negative max_reward_value",
                self.tier.as_str()
            )));
        }
        Ok(())
    }
}

/// The set of tier configs fetched at one refresh cycle. Owned by the
/// config store and replaced atomically, never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigSnapshot {
    tiers: Vec<TierConfig>,
    pub fetched_at: DateTime<Utc>,
}

impl ConfigSnapshot {
    pub fn new(tiers: Vec<TierConfig>) -> Self {
        Self {
            tiers,
            fetched_at: Utc::now(),
        }
    }

    /// Snapshot built entirely from emergency values.
    pub fn emergency() -> Self {
        Self::new(ChestTier::ALL.iter().map(|t| TierConfig::emergency(*t)).collect())
    }

    /// Tier configs in natural tier order (lowest first).
    pub fn tiers(&self) -> &[TierConfig] {
        &self.tiers
    }

    pub fn get(&self, tier: ChestTier) -> Option<&TierConfig> {
        self.tiers.iter().find(|c| c.tier == tier)
    }

    /// Checks the snapshot invariants: all five tiers present in natural
    /// order, per-tier fields sane, and the bands forming a contiguous
    /// partition of [0, 100].
    pub fn validate(&self) -> Result<()> {
        if self.tiers.len() != ChestTier::ALL.len() {
            return Err(AnalyzerError::ConfigError(format!(
                "expected {} tiers, got {}",
                ChestTier::ALL.len(),
                self.tiers.len()
            )));
        }
        for (config, expected) in self.tiers.iter().zip(ChestTier::ALL) {
            if config.tier != expected {
                return Err(AnalyzerError::ConfigError(format!(
                    "tier order violated: expected {}, found {}",
                    expected.as_str(),
                    config.tier.as_str()
                )));
            }
            config.validate()?;
        }

        const EPSILON: f64 = 1e-9;
        let first = &self.tiers[0].band;
        let last = &self.tiers[self.tiers.len() - 1].band;
        if first.min_score.abs() > EPSILON || (last.max_score - 100.0).abs() > EPSILON {
            return Err(AnalyzerError::ConfigError(format!(
                "bands must span [0, 100], got [{}, {}]",
                first.min_score, last.max_score
            )));
        }
        for pair in self.tiers.windows(2) {
            let (lower, upper) = (&pair[0].band, &pair[1].band);
            if (upper.min_score - lower.max_score).abs() > EPSILON {
                return Err(AnalyzerError::ConfigError(format!(
                    "band gap or overlap between {} and {}: {} vs {}",
                    pair[0].tier.as_str(),
                    pair[1].tier.as_str(),
                    lower.max_score,
                    upper.min_score
                )));
            }
        }
        Ok(())
    }
}
