use async_trait::async_trait;
use chest_analyzer::{
    cache::{CacheBackend, InMemoryCache},
    config::{ConfigSource, TierConfigPayload, TierConfigStore},
    models::{AnalyzerError, ChestTier, PotentialLevel, Result, UserProfile, FINAL_SCORE_KEY},
    ChestAnalyzer, Decimal, ScoringPolicy, Settings,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;

/// Config service stub that tightens Silver's minimum deposit and leaves
/// every other field to the emergency defaults.
struct StubSource;

#[async_trait]
impl ConfigSource for StubSource {
    async fn fetch_tier(&self, tier: ChestTier) -> Result<TierConfigPayload> {
        if tier == ChestTier::Silver {
            return Ok(TierConfigPayload {
                min_deposit: Some(75.0),
                ..Default::default()
            });
        }
        Ok(TierConfigPayload::default())
    }
}

struct DeadSource;

#[async_trait]
impl ConfigSource for DeadSource {
    async fn fetch_tier(&self, _tier: ChestTier) -> Result<TierConfigPayload> {
        Err(AnalyzerError::ConfigFetch("connection refused".to_string()))
    }
}

fn analyzer(settings: Settings, source: Arc<dyn ConfigSource>) -> ChestAnalyzer {
    let backend = Arc::new(InMemoryCache::new());
    let store = Arc::new(TierConfigStore::new(
        source,
        Some(backend.clone() as Arc<dyn CacheBackend>),
        settings.refresh_ttl(),
        settings.config_ttl(),
    ));
    ChestAnalyzer::new(&settings, store, backend)
}

fn high_potential_profile() -> UserProfile {
    let now = Utc::now();
    UserProfile {
        user_id: "user_001".to_string(),
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

fn low_potential_profile() -> UserProfile {
    let now = Utc::now();
    UserProfile {
        user_id: "user_002".to_string(),
        affiliate_id: "aff_002".to_string(),
        registration_date: now - ChronoDuration::days(5),
        total_deposits: Decimal::from(50),
        total_bets: 5,
        total_ggr: Decimal::from(10),
        avg_bet_value: Decimal::from(2),
        last_activity: now - ChronoDuration::days(40),
        activity_frequency: 3,
        preferred_games: Vec::new(),
        deposit_frequency: 0,
        withdrawal_frequency: 0,
        bonus_usage_rate: 0.0,
        session_duration_avg: 0.0,
        device_types: vec!["mobile".to_string()],
        geographic_region: "BR-RJ".to_string(),
        vip_level: 0,
        risk_score: 0.7,
    }
}

#[tokio::test]
async fn test_band_policy_end_to_end() {
    let analyzer = analyzer(Settings::default(), Arc::new(StubSource));

    let high = analyzer.analyze_user(&high_potential_profile()).await.unwrap();
    assert!(high.potential_score >= 60.0);
    assert!(matches!(
        high.potential_level,
        Some(PotentialLevel::High) | Some(PotentialLevel::VeryHigh)
    ));
    assert!(high.recommended_chest >= ChestTier::Gold);
    assert!((0.0..=1.0).contains(&high.confidence.unwrap()));
    assert_eq!(high.factors[FINAL_SCORE_KEY], high.potential_score);

    let low = analyzer.analyze_user(&low_potential_profile()).await.unwrap();
    assert!(low.potential_score < 20.0);
    assert_eq!(low.recommended_chest, ChestTier::Bronze);
    assert_eq!(low.potential_level, Some(PotentialLevel::VeryLow));
}

#[tokio::test]
async fn test_requirement_gated_policy_end_to_end() {
    let mut settings = Settings::default();
    settings.scoring.policy = ScoringPolicy::RequirementGated;
    let analyzer = analyzer(settings, Arc::new(StubSource));

    let analysis = analyzer.analyze_user(&high_potential_profile()).await.unwrap();
    assert!((0.0..=1.0).contains(&analysis.potential_score));
    assert!(analysis.potential_value.unwrap() > Decimal::ZERO);
    assert!(analysis.confidence.is_none());
    assert!(analysis.factors.contains_key("deposit_ratio"));

    // A profile missing every minimum scores zero and lands on Bronze.
    let empty = analyzer.analyze_user(&low_potential_profile()).await.unwrap();
    assert_eq!(empty.potential_score, 0.0);
    assert_eq!(empty.recommended_chest, ChestTier::Bronze);
    assert_eq!(empty.potential_value.unwrap(), Decimal::ZERO);
}

#[tokio::test]
async fn test_unreachable_config_service_degrades_to_emergency_values() {
    let analyzer = analyzer(Settings::default(), Arc::new(DeadSource));

    // Scoring still works end to end on the emergency snapshot.
    let analysis = analyzer.analyze_user(&high_potential_profile()).await.unwrap();
    assert!(analysis.potential_score > 0.0);
}

#[tokio::test]
async fn test_cached_result_served_within_ttl() {
    let analyzer = analyzer(Settings::default(), Arc::new(StubSource));
    let profile = high_potential_profile();

    let first = analyzer.analyze_user(&profile).await.unwrap();
    let second = analyzer.analyze_user(&profile).await.unwrap();

    assert_eq!(first.analysis_timestamp, second.analysis_timestamp);
    assert_eq!(first, second);

    let metrics = analyzer.metrics();
    assert_eq!(metrics.analyses_performed, 1);
    assert_eq!(metrics.cache_hits, 1);
}

#[tokio::test]
async fn test_batch_mixes_good_and_bad_profiles() {
    let analyzer = analyzer(Settings::default(), Arc::new(StubSource));

    let mut bad = low_potential_profile();
    bad.user_id = String::new();
    let profiles = vec![high_potential_profile(), bad, low_potential_profile()];

    let outcome = analyzer.analyze_batch(&profiles).await;
    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.results[0].user_id, "user_001");
    assert_eq!(outcome.results[1].user_id, "user_002");
}

#[tokio::test]
async fn test_stub_config_overrides_reach_the_snapshot() {
    let settings = Settings::default();
    let backend = Arc::new(InMemoryCache::new());
    let store = TierConfigStore::new(
        Arc::new(StubSource),
        Some(backend as Arc<dyn CacheBackend>),
        settings.refresh_ttl(),
        settings.config_ttl(),
    );

    let snapshot = store.current().await;
    assert!(snapshot.validate().is_ok());
    assert_eq!(
        snapshot.get(ChestTier::Silver).unwrap().requirements.min_deposit,
        Decimal::from(75)
    );
    // Untouched tiers keep emergency values.
    assert_eq!(
        snapshot.get(ChestTier::Diamond).unwrap().requirements.min_deposit,
        Decimal::from(5000)
    );
}
