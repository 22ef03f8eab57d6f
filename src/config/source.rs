use async_trait::async_trait;
use std::time::Duration;

use crate::config::TierConfigPayload;
use crate::models::{ChestTier, Result};

/// Remote source of per-tier configuration. Implementations may fail with
/// network or not-found errors; the store recovers per-field, so a source
/// never needs to synthesize defaults itself.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch_tier(&self, tier: ChestTier) -> Result<TierConfigPayload>;
}

/// HTTP client for the config service.
pub struct HttpConfigSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpConfigSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch_tier(&self, tier: ChestTier) -> Result<TierConfigPayload> {
        let url = format!(
            "{}/api/v1/config/chests/{}",
            self.base_url.trim_end_matches('/'),
            tier.as_str()
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let payload = response.json::<TierConfigPayload>().await?;
        Ok(payload)
    }
}
