use tracing::warn;

use crate::config::ConfigSnapshot;
use crate::models::ChestTier;

/// Selects the tier whose band contains the score. Tiers are checked in
/// natural order with inclusive bounds on both ends, so a value sitting on
/// a shared boundary goes to the lower tier. Falls back to the lowest tier
/// if no band matches, which the snapshot partition invariant makes
/// unreachable.
pub fn resolve_band(score: f64, snapshot: &ConfigSnapshot) -> ChestTier {
    for config in snapshot.tiers() {
        if config.band.contains(score) {
            return config.tier;
        }
    }

    warn!(score, "no tier band matched, falling back to lowest tier");
    ChestTier::lowest()
}

/// Arg-max over per-tier requirement-gated scores. Ties go to the lower
/// tier; an empty slice resolves to the lowest tier with a zero score.
pub fn resolve_gated(scores: &[(ChestTier, f64)]) -> (ChestTier, f64) {
    let mut best_tier = ChestTier::lowest();
    let mut best_score = f64::NEG_INFINITY;
    for &(tier, score) in scores {
        if score > best_score {
            best_tier = tier;
            best_score = score;
        }
    }

    if best_score.is_finite() {
        (best_tier, best_score)
    } else {
        (ChestTier::lowest(), 0.0)
    }
}
