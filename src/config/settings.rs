use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::scoring::{BandCeilings, BandWeights, ScoringPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub scoring: ScoringSettings,
    pub config_source: ConfigSourceSettings,
    pub cache: CacheSettings,
    pub batch: BatchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub policy: ScoringPolicy,
    pub weights: BandWeights,
    pub ceilings: BandCeilings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSourceSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// How long a fetched snapshot is considered Fresh.
    pub refresh_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// TTL for per-user analysis entries.
    pub result_ttl_seconds: u64,
    /// TTL for the cached config blob, independent of per-user entries.
    pub config_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    pub max_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "Chest Analyzer".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                log_level: "info".to_string(),
            },
            scoring: ScoringSettings {
                policy: ScoringPolicy::WeightedBand,
                weights: BandWeights::default(),
                ceilings: BandCeilings::default(),
            },
            config_source: ConfigSourceSettings {
                base_url: "http://config-service.internal".to_string(),
                timeout_seconds: 10,
                refresh_ttl_seconds: 300,
            },
            cache: CacheSettings {
                result_ttl_seconds: 300,
                config_ttl_seconds: 300,
            },
            batch: BatchSettings { max_concurrency: 10 },
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CHEST_ANALYZER"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .build()?;

        s.try_deserialize()
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.config_source.refresh_ttl_seconds)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.result_ttl_seconds)
    }

    pub fn config_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.config_ttl_seconds)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.scoring.weights.validate()?;
        if self.batch.max_concurrency == 0 {
            return Err("batch.max_concurrency must be at least 1".to_string());
        }
        if self.cache.result_ttl_seconds == 0 {
            return Err("cache.result_ttl_seconds must be positive".to_string());
        }
        if self.config_source.refresh_ttl_seconds == 0 {
            return Err("config_source.refresh_ttl_seconds must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.cache.result_ttl_seconds, 300);
        assert_eq!(settings.batch.max_concurrency, 10);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut settings = Settings::default();
        settings.batch.max_concurrency = 0;
        assert!(settings.validate().is_err());
    }
}
