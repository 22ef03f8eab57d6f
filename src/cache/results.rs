use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{CacheBackend, CacheKey};
use crate::models::PotentialAnalysis;

/// Cache-aside wrapper for analysis results. Backend failures degrade to
/// "always compute": a read error counts as a miss, a write error is a
/// logged no-op, and neither ever reaches the caller.
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored result verbatim on a hit; no recomputation and no
    /// TTL extension.
    pub async fn get(&self, user_id: &str) -> Option<PotentialAnalysis> {
        let key = CacheKey::analysis(user_id);
        match self.backend.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(analysis) => {
                    debug!(user_id, "analysis cache hit");
                    Some(analysis)
                }
                Err(e) => {
                    warn!(user_id, error = %e, "discarding corrupt cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(user_id, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    pub async fn put(&self, analysis: &PotentialAnalysis) {
        let key = CacheKey::analysis(&analysis.user_id);
        let raw = match serde_json::to_string(analysis) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(user_id = %analysis.user_id, error = %e, "failed to encode analysis for cache");
                return;
            }
        };
        if let Err(e) = self.backend.set(&key, &raw, self.ttl).await {
            warn!(user_id = %analysis.user_id, error = %e, "cache write failed, skipping");
        }
    }

    pub async fn invalidate(&self, user_id: &str) {
        let key = CacheKey::analysis(user_id);
        if let Err(e) = self.backend.delete(&key).await {
            warn!(user_id, error = %e, "cache invalidation failed");
        }
    }

    /// Drops every cached analysis, returning how many entries were removed.
    pub async fn invalidate_all(&self) -> u64 {
        match self.backend.delete_by_prefix(CacheKey::ANALYSIS_PREFIX).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "bulk cache invalidation failed");
                0
            }
        }
    }
}
