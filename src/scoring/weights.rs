use serde::{Deserialize, Serialize};

/// Top-level factor weights for the weighted-band policy. Fractions of the
/// final 0-100 score; must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BandWeights {
    pub monetary: f64,
    pub activity: f64,
    pub engagement: f64,
    pub stability: f64,
    pub risk: f64,
}

impl Default for BandWeights {
    fn default() -> Self {
        Self {
            monetary: 0.30,
            activity: 0.25,
            engagement: 0.20,
            stability: 0.15,
            risk: 0.10,
        }
    }
}

impl BandWeights {
    pub fn total(&self) -> f64 {
        self.monetary + self.activity + self.engagement + self.stability + self.risk
    }

    pub fn validate(&self) -> Result<(), String> {
        if (self.total() - 1.0).abs() > 0.01 {
            return Err(format!("Band weights must sum to 1.0, got {}", self.total()));
        }
        if self.monetary < 0.0
            || self.activity < 0.0
            || self.engagement < 0.0
            || self.stability < 0.0
            || self.risk < 0.0
        {
            return Err("All band weights must be non-negative".to_string());
        }
        Ok(())
    }
}

/// Normalization ceilings for the band sub-scores. Inputs are clipped to
/// these before scaling so outliers cannot dominate a factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BandCeilings {
    /// Total deposits mapping to a full deposit sub-score.
    pub deposits: f64,
    /// Total GGR mapping to a full GGR sub-score.
    pub ggr: f64,
    /// Average bet value mapping to a full bet sub-score.
    pub avg_bet: f64,
    /// Session minutes mapping to a full session sub-score.
    pub session_minutes: f64,
    /// Distinct preferred games mapping to a full variety sub-score.
    pub game_variety: f64,
    /// Day horizon for activity frequency and recency decay.
    pub activity_days: f64,
}

impl Default for BandCeilings {
    fn default() -> Self {
        Self {
            deposits: 1000.0,
            ggr: 500.0,
            avg_bet: 50.0,
            session_minutes: 60.0,
            game_variety: 10.0,
            activity_days: 30.0,
        }
    }
}
