use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheBackend, CacheKey};
use crate::config::{ConfigSnapshot, ConfigSource, TierConfig};
use crate::models::ChestTier;

struct StoreState {
    snapshot: Arc<ConfigSnapshot>,
    fetched: Instant,
}

/// Holds the current tier configuration behind a Fresh/Stale state machine.
///
/// `current()` is a pure read while Fresh. On staleness it refreshes behind
/// a single-flight gate: concurrent callers that lose the race wait on the
/// mutex, then reuse the winner's snapshot instead of issuing a duplicate
/// external fetch. Refresh never fails — any tier or field the source cannot
/// resolve falls back to the hardcoded emergency configuration, so callers
/// always receive a complete, valid snapshot.
pub struct TierConfigStore {
    source: Arc<dyn ConfigSource>,
    cache: Option<Arc<dyn CacheBackend>>,
    state: RwLock<Option<StoreState>>,
    refresh_gate: Mutex<()>,
    refresh_ttl: Duration,
    config_cache_ttl: Duration,
}

impl TierConfigStore {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        cache: Option<Arc<dyn CacheBackend>>,
        refresh_ttl: Duration,
        config_cache_ttl: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            state: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            refresh_ttl,
            config_cache_ttl,
        }
    }

    /// Returns the current snapshot, refreshing first if Stale. Infallible:
    /// availability is prioritized over freshness.
    pub async fn current(&self) -> Arc<ConfigSnapshot> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        let _flight = self.refresh_gate.lock().await;
        // Another caller may have completed the refresh while we waited.
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }
        self.refresh().await
    }

    fn fresh_snapshot(&self) -> Option<Arc<ConfigSnapshot>> {
        let state = self.state.read().ok()?;
        let state = state.as_ref()?;
        if state.fetched.elapsed() < self.refresh_ttl {
            Some(Arc::clone(&state.snapshot))
        } else {
            None
        }
    }

    async fn refresh(&self) -> Arc<ConfigSnapshot> {
        let snapshot = match self.load_cached().await {
            Some(snapshot) => {
                debug!("tier configs loaded from cache backend");
                snapshot
            }
            None => {
                let snapshot = self.fetch_all().await;
                self.store_cached(&snapshot).await;
                snapshot
            }
        };

        let snapshot = Arc::new(snapshot);
        if let Ok(mut state) = self.state.write() {
            *state = Some(StoreState {
                snapshot: Arc::clone(&snapshot),
                fetched: Instant::now(),
            });
        }
        info!(fetched_at = %snapshot.fetched_at, "tier config snapshot installed");
        snapshot
    }

    /// Fetches every tier from the config source. A failed tier falls back
    /// to emergency values; a partial payload falls back per-field.
    async fn fetch_all(&self) -> ConfigSnapshot {
        let mut tiers = Vec::with_capacity(ChestTier::ALL.len());
        for tier in ChestTier::ALL {
            let config = match self.source.fetch_tier(tier).await {
                Ok(payload) => TierConfig::from_payload(tier, payload),
                Err(e) => {
                    warn!(tier = tier.as_str(), error = %e, "config fetch failed, using emergency values");
                    TierConfig::emergency(tier)
                }
            };
            tiers.push(config);
        }

        let snapshot = ConfigSnapshot::new(tiers);
        match snapshot.validate() {
            Ok(()) => snapshot,
            Err(e) => {
                error!(error = %e, "fetched config failed validation, using emergency snapshot");
                ConfigSnapshot::emergency()
            }
        }
    }

    async fn load_cached(&self) -> Option<ConfigSnapshot> {
        let cache = self.cache.as_ref()?;
        match cache.get(CacheKey::CONFIGS).await {
            Ok(Some(raw)) => match serde_json::from_str::<ConfigSnapshot>(&raw) {
                Ok(snapshot) if snapshot.validate().is_ok() => Some(snapshot),
                Ok(_) => {
                    warn!("cached tier configs failed validation, refetching");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "cached tier configs unreadable, refetching");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "config cache read failed, refetching");
                None
            }
        }
    }

    async fn store_cached(&self, snapshot: &ConfigSnapshot) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        match serde_json::to_string(snapshot) {
            Ok(raw) => {
                if let Err(e) = cache.set(CacheKey::CONFIGS, &raw, self.config_cache_ttl).await {
                    warn!(error = %e, "config cache write failed");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode tier configs for cache"),
        }
    }
}
