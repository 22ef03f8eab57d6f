pub mod settings;
pub mod source;
pub mod store;
pub mod tiers;

pub use settings::{
    AppSettings, BatchSettings, CacheSettings, ConfigSourceSettings, ScoringSettings, Settings,
};
pub use source::{ConfigSource, HttpConfigSource};
pub use store::TierConfigStore;
pub use tiers::{
    ConfigSnapshot, RequirementWeights, RewardRanges, ScoreBand, TierConfig, TierConfigPayload,
    TierRequirements, ValueRange,
};
