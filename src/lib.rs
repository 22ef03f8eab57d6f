pub mod analysis;
pub mod cache;
pub mod config;
pub mod models;
pub mod scoring;

pub use analysis::{BatchOutcome, ChestAnalyzer, MetricsSnapshot};
pub use cache::{CacheBackend, InMemoryCache, ResultCache};
pub use config::{ConfigSnapshot, ConfigSource, HttpConfigSource, Settings, TierConfig, TierConfigStore};
pub use models::{
    AnalyzerError, ChestTier, Factors, PotentialAnalysis, PotentialLevel, Result, UserProfile,
};
pub use scoring::ScoringPolicy;

// Re-export commonly used types
pub use rust_decimal::Decimal;
