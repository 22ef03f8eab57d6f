use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AnalyzerError, Result};

/// Reward tiers, ordered lowest to highest value. Iteration over `ALL`
/// defines the tie-break order for scores landing on a shared band boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChestTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl ChestTier {
    pub const ALL: [ChestTier; 5] = [
        ChestTier::Bronze,
        ChestTier::Silver,
        ChestTier::Gold,
        ChestTier::Platinum,
        ChestTier::Diamond,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChestTier::Bronze => "bronze",
            ChestTier::Silver => "silver",
            ChestTier::Gold => "gold",
            ChestTier::Platinum => "platinum",
            ChestTier::Diamond => "diamond",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bronze" => Some(ChestTier::Bronze),
            "silver" => Some(ChestTier::Silver),
            "gold" => Some(ChestTier::Gold),
            "platinum" => Some(ChestTier::Platinum),
            "diamond" => Some(ChestTier::Diamond),
            _ => None,
        }
    }

    pub fn lowest() -> Self {
        ChestTier::Bronze
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PotentialLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl PotentialLevel {
    /// Level bands over the 0-100 score scale.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => PotentialLevel::VeryHigh,
            s if s >= 60.0 => PotentialLevel::High,
            s if s >= 40.0 => PotentialLevel::Medium,
            s if s >= 20.0 => PotentialLevel::Low,
            _ => PotentialLevel::VeryLow,
        }
    }
}

/// Immutable behavioral snapshot of a user, produced entirely by the caller.
/// Monetary totals use `Decimal`; they are converted to `f64` at the scoring
/// seams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub affiliate_id: String,
    pub registration_date: DateTime<Utc>,
    pub total_deposits: Decimal,
    pub total_bets: u32,
    pub total_ggr: Decimal,
    #[serde(default)]
    pub avg_bet_value: Decimal,
    pub last_activity: DateTime<Utc>,
    /// Active days within the last 30.
    #[serde(default)]
    pub activity_frequency: u32,
    #[serde(default)]
    pub preferred_games: Vec<String>,
    /// Deposits within the last 30 days.
    #[serde(default)]
    pub deposit_frequency: u32,
    /// Withdrawals within the last 30 days.
    #[serde(default)]
    pub withdrawal_frequency: u32,
    /// Share of offered bonuses used, 0-1.
    #[serde(default)]
    pub bonus_usage_rate: f64,
    /// Average session length in minutes.
    #[serde(default)]
    pub session_duration_avg: f64,
    #[serde(default)]
    pub device_types: Vec<String>,
    #[serde(default)]
    pub geographic_region: String,
    #[serde(default)]
    pub vip_level: u8,
    /// 0-1, where 1 is high risk.
    #[serde(default)]
    pub risk_score: f64,
}

impl UserProfile {
    /// Rejects malformed input before it reaches scoring or the cache.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(AnalyzerError::InvalidProfile {
                user_id: self.user_id.clone(),
                message: "user_id must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.risk_score) {
            return Err(AnalyzerError::InvalidProfile {
                user_id: self.user_id.clone(),
                message: format!("risk_score {} outside [0, 1]", self.risk_score),
            });
        }
        if !(0.0..=1.0).contains(&self.bonus_usage_rate) {
            return Err(AnalyzerError::InvalidProfile {
                user_id: self.user_id.clone(),
                message: format!("bonus_usage_rate {} outside [0, 1]", self.bonus_usage_rate),
            });
        }
        if self.total_deposits < Decimal::ZERO || self.avg_bet_value < Decimal::ZERO {
            return Err(AnalyzerError::InvalidProfile {
                user_id: self.user_id.clone(),
                message: "monetary totals must not be negative".to_string(),
            });
        }
        if self.session_duration_avg < 0.0 {
            return Err(AnalyzerError::InvalidProfile {
                user_id: self.user_id.clone(),
                message: "session_duration_avg must not be negative".to_string(),
            });
        }
        Ok(())
    }

    pub fn days_since_registration(&self, now: DateTime<Utc>) -> i64 {
        (now - self.registration_date).num_days().max(0)
    }

    pub fn days_since_activity(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_activity).num_days().max(0)
    }
}
