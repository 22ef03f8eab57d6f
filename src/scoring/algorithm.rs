use chrono::{DateTime, Utc};

use crate::models::{Factors, UserProfile, FINAL_SCORE_KEY};
use crate::scoring::{BandCeilings, BandWeights};

/// Weighted-band potential scorer.
///
/// Five independent sub-scores (monetary, activity, engagement, stability,
/// risk), each normalized to 0-100, scaled by its factor weight and summed
/// into a final score clamped to [0, 100]. Pure and deterministic: `now` is
/// passed in so identical inputs always produce identical output, which the
/// result cache depends on.
pub struct BandScorer {
    weights: BandWeights,
    ceilings: BandCeilings,
}

impl BandScorer {
    pub fn new(weights: BandWeights, ceilings: BandCeilings) -> Self {
        Self { weights, ceilings }
    }

    pub fn score(&self, profile: &UserProfile, now: DateTime<Utc>) -> (f64, Factors) {
        let mut factors = Factors::new();

        // Monetary: deposits 40%, GGR 35%, average bet 25% of the sub-score.
        let mut monetary_score = 0.0;

        let deposits: f64 = profile.total_deposits.try_into().unwrap_or(0.0);
        if deposits > 0.0 {
            let deposit_score = (deposits / self.ceilings.deposits).min(1.0) * 40.0;
            monetary_score += deposit_score;
            factors.insert("deposits".to_string(), deposit_score);
        }

        let ggr: f64 = profile.total_ggr.try_into().unwrap_or(0.0);
        if ggr > 0.0 {
            let ggr_score = (ggr / self.ceilings.ggr).min(1.0) * 35.0;
            monetary_score += ggr_score;
            factors.insert("ggr".to_string(), ggr_score);
        }

        let avg_bet: f64 = profile.avg_bet_value.try_into().unwrap_or(0.0);
        if avg_bet > 0.0 {
            let bet_score = (avg_bet / self.ceilings.avg_bet).min(1.0) * 25.0;
            monetary_score += bet_score;
            factors.insert("avg_bet".to_string(), bet_score);
        }

        let monetary_factor = monetary_score * self.weights.monetary;

        // Activity: frequency 50%, recency 30%, session duration 20%.
        let horizon = self.ceilings.activity_days;
        let activity_freq_score =
            (profile.activity_frequency as f64 / horizon).min(1.0) * 50.0;
        factors.insert("activity_frequency".to_string(), activity_freq_score);

        let days_since_last = profile.days_since_activity(now) as f64;
        let recency_score = ((horizon - days_since_last) / horizon).max(0.0) * 30.0;
        factors.insert("recency".to_string(), recency_score);

        let session_score =
            (profile.session_duration_avg / self.ceilings.session_minutes).min(1.0) * 20.0;
        factors.insert("session_duration".to_string(), session_score);

        let activity_factor =
            (activity_freq_score + recency_score + session_score) * self.weights.activity;

        // Engagement: game variety 60%, bonus usage 40%.
        let game_variety_score =
            (profile.preferred_games.len() as f64 / self.ceilings.game_variety).min(1.0) * 60.0;
        factors.insert("game_variety".to_string(), game_variety_score);

        let bonus_score = profile.bonus_usage_rate * 40.0;
        factors.insert("bonus_usage".to_string(), bonus_score);

        let engagement_factor = (game_variety_score + bonus_score) * self.weights.engagement;

        // Stability: deposit-to-withdrawal ratio; no withdrawals is
        // maximally stable.
        let stability_score = if profile.withdrawal_frequency > 0 {
            let ratio = profile.deposit_frequency as f64 / profile.withdrawal_frequency as f64;
            (ratio / 3.0).min(1.0) * 100.0
        } else {
            100.0
        };
        factors.insert("stability".to_string(), stability_score);
        let stability_factor = stability_score * self.weights.stability;

        // Risk, inverted: lower risk contributes more.
        let risk_factor = (1.0 - profile.risk_score) * 10.0 * self.weights.risk;
        factors.insert("risk".to_string(), risk_factor);

        let total = monetary_factor + activity_factor + engagement_factor
            + stability_factor
            + risk_factor;
        let final_score = total.clamp(0.0, 100.0);

        factors.insert("monetary_factor".to_string(), monetary_factor);
        factors.insert("activity_factor".to_string(), activity_factor);
        factors.insert("engagement_factor".to_string(), engagement_factor);
        factors.insert("stability_factor".to_string(), stability_factor);
        factors.insert("risk_factor".to_string(), risk_factor);
        factors.insert(FINAL_SCORE_KEY.to_string(), final_score);

        (final_score, factors)
    }
}
