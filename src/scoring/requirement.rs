use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::{ConfigSnapshot, TierConfig};
use crate::models::{ChestTier, Factors, UserProfile, FINAL_SCORE_KEY};

const RATIO_CAP: f64 = 3.0;
const LOYALTY_CAP: f64 = 2.0;
const LOYALTY_HORIZON_DAYS: f64 = 30.0;
const VIP_CEILING: f64 = 5.0;

/// Requirement-gated fit score for one tier, in [0, 1]. Any failed minimum
/// gates the tier to exactly 0; otherwise a weighted sum of capped ratios is
/// scaled by the tier's base probability.
pub fn score_tier(profile: &UserProfile, config: &TierConfig, now: DateTime<Utc>) -> f64 {
    let req = &config.requirements;
    if profile.total_deposits < req.min_deposit
        || profile.total_bets < req.min_bets
        || profile.total_ggr < req.min_ggr
        || profile.vip_level < req.min_vip_level
    {
        return 0.0;
    }

    let deposits: f64 = profile.total_deposits.try_into().unwrap_or(0.0);
    let min_deposit: f64 = req.min_deposit.try_into().unwrap_or(0.0);
    let deposit_factor = if min_deposit > 0.0 {
        (deposits / min_deposit).min(RATIO_CAP)
    } else {
        0.0
    };

    let activity_factor = if req.min_bets > 0 {
        (profile.total_bets as f64 / req.min_bets as f64).min(RATIO_CAP)
    } else {
        0.0
    };

    let loyalty_factor =
        (profile.days_since_registration(now) as f64 / LOYALTY_HORIZON_DAYS).min(LOYALTY_CAP);

    let vip_factor = if profile.vip_level > 0 {
        (profile.vip_level as f64 / VIP_CEILING).min(1.0)
    } else {
        0.1
    };

    let weighted = deposit_factor * config.weights.deposit
        + activity_factor * config.weights.activity
        + loyalty_factor * config.weights.loyalty
        + vip_factor * config.weights.vip;

    (weighted * config.base_probability).clamp(0.0, 1.0)
}

/// Scores every tier in the snapshot, in natural tier order.
pub fn score_all(
    profile: &UserProfile,
    snapshot: &ConfigSnapshot,
    now: DateTime<Utc>,
) -> Vec<(ChestTier, f64)> {
    snapshot
        .tiers()
        .iter()
        .map(|config| (config.tier, score_tier(profile, config, now)))
        .collect()
}

/// Potential monetary value of the recommended tier: max reward scaled by
/// the fit score, boosted for VIP level and recent activity, rounded to two
/// decimal places.
pub fn potential_value(
    profile: &UserProfile,
    config: &TierConfig,
    score: f64,
    now: DateTime<Utc>,
) -> Decimal {
    let mut value = config.max_reward_value * Decimal::try_from(score).unwrap_or_default();

    if profile.vip_level >= 3 {
        value *= Decimal::new(15, 1);
    } else if profile.vip_level >= 1 {
        value *= Decimal::new(12, 1);
    }

    let days_since_activity = profile.days_since_activity(now);
    if days_since_activity <= 1 {
        value *= Decimal::new(13, 1);
    } else if days_since_activity <= 7 {
        value *= Decimal::new(11, 1);
    }

    value.round_dp(2)
}

/// Explainability factors for the winning tier: raw requirement ratios plus
/// the weights that combined them.
pub fn analysis_factors(
    profile: &UserProfile,
    config: &TierConfig,
    score: f64,
    now: DateTime<Utc>,
) -> Factors {
    let mut factors = Factors::new();

    let deposits: f64 = profile.total_deposits.try_into().unwrap_or(0.0);
    let min_deposit: f64 = config.requirements.min_deposit.try_into().unwrap_or(0.0);
    let ggr: f64 = profile.total_ggr.try_into().unwrap_or(0.0);
    let min_ggr: f64 = config.requirements.min_ggr.try_into().unwrap_or(0.0);

    factors.insert(
        "deposit_ratio".to_string(),
        if min_deposit > 0.0 { deposits / min_deposit } else { 0.0 },
    );
    factors.insert(
        "bets_ratio".to_string(),
        if config.requirements.min_bets > 0 {
            profile.total_bets as f64 / config.requirements.min_bets as f64
        } else {
            0.0
        },
    );
    factors.insert(
        "ggr_ratio".to_string(),
        if min_ggr > 0.0 { ggr / min_ggr } else { 0.0 },
    );
    factors.insert("vip_level".to_string(), profile.vip_level as f64);
    factors.insert(
        "days_since_registration".to_string(),
        profile.days_since_registration(now) as f64,
    );
    factors.insert(
        "days_since_activity".to_string(),
        profile.days_since_activity(now) as f64,
    );
    factors.insert("weight_deposit".to_string(), config.weights.deposit);
    factors.insert("weight_activity".to_string(), config.weights.activity);
    factors.insert("weight_loyalty".to_string(), config.weights.loyalty);
    factors.insert("weight_vip".to_string(), config.weights.vip);
    factors.insert(FINAL_SCORE_KEY.to_string(), score);

    factors
}
