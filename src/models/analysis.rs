use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{ChestTier, PotentialLevel};

/// Ordered factor-name -> contribution map used for explainability and
/// caching, never for control flow. The terminal aggregate is always present
/// under [`FINAL_SCORE_KEY`].
pub type Factors = BTreeMap<String, f64>;

pub const FINAL_SCORE_KEY: &str = "final_score";

/// Result of one potential analysis. Created once per (user, config
/// snapshot) pair and superseded by the next computation, never mutated.
///
/// `confidence` and `potential_level` are produced by the weighted-band
/// policy, `potential_value` by the requirement-gated policy; the remaining
/// fields are common to both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotentialAnalysis {
    pub user_id: String,
    pub recommended_chest: ChestTier,
    pub potential_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_level: Option<PotentialLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_value: Option<Decimal>,
    pub factors: Factors,
    pub analysis_timestamp: DateTime<Utc>,
    pub cache_ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PotentialAnalysis {
        let mut factors = Factors::new();
        factors.insert("deposits".to_string(), 40.0);
        factors.insert("stability".to_string(), 100.0);
        factors.insert(FINAL_SCORE_KEY.to_string(), 74.92);

        PotentialAnalysis {
            user_id: "user_001".to_string(),
            recommended_chest: ChestTier::Platinum,
            potential_score: 74.92,
            potential_level: Some(PotentialLevel::High),
            confidence: Some(0.79),
            potential_value: None,
            factors,
            analysis_timestamp: Utc::now(),
            cache_ttl_secs: 300,
        }
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let analysis = sample();
        let encoded = serde_json::to_string(&analysis).unwrap();
        let decoded: PotentialAnalysis = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, analysis);
    }

    #[test]
    fn test_round_trip_preserves_decimal_value() {
        let mut analysis = sample();
        analysis.potential_level = None;
        analysis.confidence = None;
        analysis.potential_value = Some(Decimal::new(9750, 2));

        let encoded = serde_json::to_string(&analysis).unwrap();
        let decoded: PotentialAnalysis = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, analysis);
        assert_eq!(decoded.potential_value, Some(Decimal::new(9750, 2)));
    }

    #[test]
    fn test_tier_serializes_as_lowercase_name() {
        let encoded = serde_json::to_value(sample()).unwrap();
        assert_eq!(encoded["recommended_chest"], "platinum");
        assert_eq!(encoded["potential_level"], "high");
        // Absent optionals are omitted, not serialized as null.
        assert!(encoded.get("potential_value").is_none());
    }
}
