use chrono::{DateTime, Utc};

use crate::models::UserProfile;

const HISTORY_HORIZON_DAYS: f64 = 90.0;
const RECENCY_HORIZON_DAYS: f64 = 7.0;
const VOLUME_SATURATION: f64 = 50.0;
const SCORE_MIDPOINT: f64 = 50.0;

/// Estimates how trustworthy a band-policy score is, from data recency,
/// volume and account age. Mean of four sub-confidences, each clamped to
/// [0, 1]; always returns a value in [0, 1].
pub fn estimate(profile: &UserProfile, score: f64, now: DateTime<Utc>) -> f64 {
    let history = (profile.days_since_registration(now) as f64 / HISTORY_HORIZON_DAYS)
        .clamp(0.0, 1.0);

    let days_since_last = profile.days_since_activity(now) as f64;
    let recency =
        ((RECENCY_HORIZON_DAYS - days_since_last) / RECENCY_HORIZON_DAYS).clamp(0.0, 1.0);

    let volume = ((profile.total_bets + profile.deposit_frequency) as f64 / VOLUME_SATURATION)
        .clamp(0.0, 1.0);

    // Scores far from the midpoint are treated as less certain.
    let consistency = (1.0 - (score - SCORE_MIDPOINT).abs() / SCORE_MIDPOINT).clamp(0.0, 1.0);

    (history + recency + volume + consistency) / 4.0
}
