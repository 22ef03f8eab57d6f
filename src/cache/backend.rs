use async_trait::async_trait;
use std::time::Duration;

use crate::models::Result;

/// Contract with the external key-value store. Values are JSON text. Every
/// operation may fail or time out; callers must degrade gracefully and
/// treat the backend as an accelerator, not a source of truth.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every entry whose key starts with `prefix`, returning the
    /// number of removed entries.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64>;
}

/// Cache key builder for consistent key generation. Analysis entries are
/// namespaced separately from the config blob.
pub struct CacheKey;

impl CacheKey {
    pub const ANALYSIS_PREFIX: &'static str = "chest_analysis:";
    pub const CONFIGS: &'static str = "chest_configs";

    pub fn analysis(user_id: &str) -> String {
        format!("{}{}", Self::ANALYSIS_PREFIX, user_id)
    }
}
