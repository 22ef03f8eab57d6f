use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::analysis::{AnalyzerMetrics, MetricsSnapshot};
use crate::cache::{CacheBackend, ResultCache};
use crate::config::{ConfigSnapshot, Settings, TierConfig, TierConfigStore};
use crate::models::{PotentialAnalysis, PotentialLevel, Result, UserProfile};
use crate::scoring::{self, confidence, requirement, BandScorer, ScoringPolicy};

/// Failed batch item, correlated back to its input by user id.
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub user_id: String,
    pub message: String,
}

/// Outcome of a batch run: successes in input order, per-item errors, and
/// the attempted/succeeded counts for observability.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub results: Vec<PotentialAnalysis>,
    pub errors: Vec<BatchError>,
}

/// Front door of the engine: cache-aside single-user analysis plus the
/// bounded-concurrency batch orchestrator.
pub struct ChestAnalyzer {
    policy: ScoringPolicy,
    scorer: BandScorer,
    store: Arc<TierConfigStore>,
    cache: ResultCache,
    metrics: AnalyzerMetrics,
    max_concurrency: usize,
}

impl ChestAnalyzer {
    pub fn new(
        settings: &Settings,
        store: Arc<TierConfigStore>,
        backend: Arc<dyn CacheBackend>,
    ) -> Self {
        Self {
            policy: settings.scoring.policy,
            scorer: BandScorer::new(settings.scoring.weights, settings.scoring.ceilings),
            store,
            cache: ResultCache::new(backend, settings.result_ttl()),
            metrics: AnalyzerMetrics::default(),
            max_concurrency: settings.batch.max_concurrency,
        }
    }

    /// Analyzes one user through the cache-aside path. Invalid profiles
    /// surface immediately and are never cached; a cache hit is returned
    /// verbatim without recomputation.
    pub async fn analyze_user(&self, profile: &UserProfile) -> Result<PotentialAnalysis> {
        profile.validate()?;

        if let Some(cached) = self.cache.get(&profile.user_id).await {
            self.metrics.record_hit();
            return Ok(cached);
        }
        self.metrics.record_miss();

        let snapshot = self.store.current().await;
        let analysis = self.compute(profile, &snapshot, Utc::now());
        self.cache.put(&analysis).await;
        self.metrics.record_analysis();

        info!(
            user_id = %analysis.user_id,
            score = analysis.potential_score,
            chest = analysis.recommended_chest.as_str(),
            "analysis complete"
        );
        Ok(analysis)
    }

    fn compute(
        &self,
        profile: &UserProfile,
        snapshot: &ConfigSnapshot,
        now: DateTime<Utc>,
    ) -> PotentialAnalysis {
        match self.policy {
            ScoringPolicy::WeightedBand => {
                let (score, factors) = self.scorer.score(profile, now);
                let chest = scoring::resolve_band(score, snapshot);
                let confidence = confidence::estimate(profile, score, now);

                PotentialAnalysis {
                    user_id: profile.user_id.clone(),
                    recommended_chest: chest,
                    potential_score: score,
                    potential_level: Some(PotentialLevel::from_score(score)),
                    confidence: Some(confidence),
                    potential_value: None,
                    factors,
                    analysis_timestamp: now,
                    cache_ttl_secs: self.cache.ttl().as_secs(),
                }
            }
            ScoringPolicy::RequirementGated => {
                let scores = requirement::score_all(profile, snapshot, now);
                let (chest, score) = scoring::resolve_gated(&scores);
                let fallback;
                let config = match snapshot.get(chest) {
                    Some(config) => config,
                    None => {
                        fallback = TierConfig::emergency(chest);
                        &fallback
                    }
                };
                let value = requirement::potential_value(profile, config, score, now);
                let factors = requirement::analysis_factors(profile, config, score, now);

                PotentialAnalysis {
                    user_id: profile.user_id.clone(),
                    recommended_chest: chest,
                    potential_score: score,
                    potential_level: None,
                    confidence: None,
                    potential_value: Some(value),
                    factors,
                    analysis_timestamp: now,
                    cache_ttl_secs: self.cache.ttl().as_secs(),
                }
            }
        }
    }

    /// Fans the profiles out over a bounded worker pool and waits for all
    /// of them. Per-item failures are isolated: a bad profile is reported
    /// in `errors` while its siblings complete normally. Successes keep the
    /// input order.
    pub async fn analyze_batch(&self, profiles: &[UserProfile]) -> BatchOutcome {
        info!(count = profiles.len(), "starting batch analysis");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let tasks = profiles.iter().map(|profile| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // Never closed, so acquisition only fails on programmer error.
                let _permit = semaphore.acquire().await.expect("batch semaphore closed");
                self.analyze_user(profile).await
            }
        });
        let outcomes = join_all(tasks).await;

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for (profile, outcome) in profiles.iter().zip(outcomes) {
            match outcome {
                Ok(analysis) => results.push(analysis),
                Err(e) => {
                    warn!(user_id = %profile.user_id, error = %e, "batch item failed");
                    errors.push(BatchError {
                        user_id: profile.user_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        self.metrics.record_batch(errors.len() as u64);
        info!(
            attempted = profiles.len(),
            succeeded = results.len(),
            failed = errors.len(),
            "batch analysis complete"
        );

        BatchOutcome {
            attempted: profiles.len(),
            succeeded: results.len(),
            results,
            errors,
        }
    }

    /// Drops every cached analysis (for example after a scoring rollout).
    pub async fn invalidate_cached(&self, user_id: Option<&str>) -> u64 {
        match user_id {
            Some(user_id) => {
                self.cache.invalidate(user_id).await;
                1
            }
            None => self.cache.invalidate_all().await,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryCache, MockCacheBackend};
    use crate::config::{ConfigSource, TierConfigPayload};
    use crate::models::{AnalyzerError, ChestTier};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use rust_decimal::Decimal;
    use std::time::Duration;

    /// Unreachable config service; the store recovers with emergency values.
    struct DeadSource;

    #[async_trait]
    impl ConfigSource for DeadSource {
        async fn fetch_tier(&self, _tier: ChestTier) -> Result<TierConfigPayload> {
            Err(AnalyzerError::ConfigFetch("service unreachable".to_string()))
        }
    }

    fn analyzer_with(settings: Settings, backend: Arc<dyn CacheBackend>) -> ChestAnalyzer {
        let store = Arc::new(TierConfigStore::new(
            Arc::new(DeadSource),
            None,
            settings.refresh_ttl(),
            settings.config_ttl(),
        ));
        ChestAnalyzer::new(&settings, store, backend)
    }

    fn band_analyzer() -> ChestAnalyzer {
        analyzer_with(Settings::default(), Arc::new(InMemoryCache::new()))
    }

    fn gated_analyzer() -> ChestAnalyzer {
        let mut settings = Settings::default();
        settings.scoring.policy = ScoringPolicy::RequirementGated;
        analyzer_with(settings, Arc::new(InMemoryCache::new()))
    }

    fn high_potential_profile(user_id: &str) -> UserProfile {
        let now = Utc::now();
        UserProfile {
            user_id: user_id.to_string(),
            affiliate_id: "aff_001".to_string(),
            registration_date: now - ChronoDuration::days(60),
            total_deposits: Decimal::from(2500),
            total_bets: 150,
            total_ggr: Decimal::from(800),
            avg_bet_value: Decimal::from(25),
            last_activity: now - ChronoDuration::hours(2),
            activity_frequency: 25,
            preferred_games: vec![
                "slots".to_string(),
                "blackjack".to_string(),
                "roulette".to_string(),
                "poker".to_string(),
            ],
            deposit_frequency: 8,
            withdrawal_frequency: 2,
            bonus_usage_rate: 0.8,
            session_duration_avg: 45.0,
            device_types: vec!["mobile".to_string(), "desktop".to_string()],
            geographic_region: "BR-SP".to_string(),
            vip_level: 4,
            risk_score: 0.2,
        }
    }

    #[tokio::test]
    async fn test_band_policy_produces_confidence_not_value() {
        let analyzer = band_analyzer();
        let analysis = analyzer
            .analyze_user(&high_potential_profile("user_001"))
            .await
            .unwrap();

        assert!(analysis.potential_score >= 60.0);
        assert!(matches!(
            analysis.potential_level,
            Some(PotentialLevel::High) | Some(PotentialLevel::VeryHigh)
        ));
        let confidence = analysis.confidence.unwrap();
        assert!((0.0..=1.0).contains(&confidence));
        assert!(analysis.potential_value.is_none());
        assert_eq!(analysis.cache_ttl_secs, 300);
    }

    #[tokio::test]
    async fn test_gated_policy_produces_value_not_confidence() {
        let analyzer = gated_analyzer();
        let analysis = analyzer
            .analyze_user(&high_potential_profile("user_001"))
            .await
            .unwrap();

        assert!((0.0..=1.0).contains(&analysis.potential_score));
        assert!(analysis.confidence.is_none());
        assert!(analysis.potential_value.unwrap() > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_returns_cached_result() {
        let analyzer = band_analyzer();
        let profile = high_potential_profile("user_001");

        let first = analyzer.analyze_user(&profile).await.unwrap();
        let second = analyzer.analyze_user(&profile).await.unwrap();
        assert_eq!(second.analysis_timestamp, first.analysis_timestamp);
        assert_eq!(second, first);

        let metrics = analyzer.metrics();
        assert_eq!(metrics.analyses_performed, 1);
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_recomputation() {
        let mut settings = Settings::default();
        settings.cache.result_ttl_seconds = 1;
        let analyzer = analyzer_with(settings, Arc::new(InMemoryCache::new()));
        let profile = high_potential_profile("user_001");

        let first = analyzer.analyze_user(&profile).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let second = analyzer.analyze_user(&profile).await.unwrap();

        assert!(second.analysis_timestamp > first.analysis_timestamp);
        assert_eq!(analyzer.metrics().analyses_performed, 2);
    }

    #[tokio::test]
    async fn test_invalid_profile_is_rejected_and_never_cached() {
        let analyzer = band_analyzer();
        let mut profile = high_potential_profile("");
        assert!(analyzer.analyze_user(&profile).await.is_err());

        profile.user_id = "user_001".to_string();
        profile.risk_score = 2.0;
        assert!(matches!(
            analyzer.analyze_user(&profile).await,
            Err(AnalyzerError::InvalidProfile { .. })
        ));
        assert_eq!(analyzer.metrics().analyses_performed, 0);
    }

    #[tokio::test]
    async fn test_unavailable_cache_degrades_to_compute() {
        let mut backend = MockCacheBackend::new();
        backend
            .expect_get()
            .returning(|_| Err(AnalyzerError::CacheError("backend down".to_string())));
        backend
            .expect_set()
            .returning(|_, _, _| Err(AnalyzerError::CacheError("backend down".to_string())));

        let analyzer = analyzer_with(Settings::default(), Arc::new(backend));
        let analysis = analyzer
            .analyze_user(&high_potential_profile("user_001"))
            .await
            .unwrap();
        assert!(analysis.potential_score > 0.0);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures_and_keeps_order() {
        let analyzer = band_analyzer();
        let mut profiles = vec![
            high_potential_profile("user_a"),
            high_potential_profile("user_b"),
            high_potential_profile("user_c"),
        ];
        profiles[1].user_id = String::new();

        let outcome = analyzer.analyze_batch(&profiles).await;
        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].user_id, "");
        assert_eq!(outcome.results[0].user_id, "user_a");
        assert_eq!(outcome.results[1].user_id, "user_c");

        let metrics = analyzer.metrics();
        assert_eq!(metrics.batches_run, 1);
        assert_eq!(metrics.batch_items_failed, 1);
    }

    #[tokio::test]
    async fn test_batch_larger_than_pool_completes() {
        let mut settings = Settings::default();
        settings.batch.max_concurrency = 2;
        let analyzer = analyzer_with(settings, Arc::new(InMemoryCache::new()));

        let profiles: Vec<UserProfile> = (0..12)
            .map(|i| high_potential_profile(&format!("user_{i}")))
            .collect();
        let outcome = analyzer.analyze_batch(&profiles).await;
        assert_eq!(outcome.succeeded, 12);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_computation() {
        let analyzer = band_analyzer();
        let profile = high_potential_profile("user_001");

        let first = analyzer.analyze_user(&profile).await.unwrap();
        analyzer.invalidate_cached(Some("user_001")).await;
        let second = analyzer.analyze_user(&profile).await.unwrap();

        assert!(second.analysis_timestamp >= first.analysis_timestamp);
        assert_eq!(analyzer.metrics().analyses_performed, 2);
    }
}
