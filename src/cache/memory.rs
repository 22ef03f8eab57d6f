use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::cache::CacheBackend;
use crate::models::{AnalyzerError, Result};

/// Cache entry with TTL.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// In-memory implementation of the cache backend contract. Expired entries
/// are skipped on read and purged by `cleanup_expired`.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cleanup_expired(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AnalyzerError::CacheError("cache lock poisoned".to_string()))?;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AnalyzerError::CacheError("cache lock poisoned".to_string()))?;
        entries.insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AnalyzerError::CacheError("cache lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AnalyzerError::CacheError("cache lock poisoned".to_string()))?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let cache = InMemoryCache::new();
        cache
            .set("k1", "value", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("k1").await.unwrap(), Some("value".to_string()));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let cache = InMemoryCache::new();
        cache
            .set("k1", "value", Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get("k1").await.unwrap(), None);

        cache.cleanup_expired();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_prefix_counts_removals() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("chest_analysis:a", "1", ttl).await.unwrap();
        cache.set("chest_analysis:b", "2", ttl).await.unwrap();
        cache.set("chest_configs", "3", ttl).await.unwrap();

        let removed = cache.delete_by_prefix("chest_analysis:").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get("chest_configs").await.unwrap(), Some("3".to_string()));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = InMemoryCache::new();
        cache.set("k1", "v", Duration::from_secs(60)).await.unwrap();
        cache.delete("k1").await.unwrap();
        cache.delete("k1").await.unwrap();
        assert_eq!(cache.get("k1").await.unwrap(), None);
    }
}
