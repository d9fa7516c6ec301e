//! Unit tests for the service rate estimator
//!
//! Tests EMA updates, hour windows and failure handling over in-memory stores.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use queue_eta::config::EtaConfig;
use queue_eta::error::AppError;
use queue_eta::models::{time_window_for, EtaStats, PercentileSeed};
use queue_eta::services::ServiceRateEstimator;
use queue_eta::store::{InMemoryStatsStore, NoopStatsStore, StatsStore};

use crate::common::{t0, FailingStatsStore};

fn estimator(stats: Arc<dyn StatsStore>) -> ServiceRateEstimator {
    ServiceRateEstimator::new(stats, &EtaConfig::default())
}

// =============================================================================
// EMA
// =============================================================================

#[tokio::test]
async fn test_first_observation_creates_window() {
    let store = Arc::new(InMemoryStatsStore::new());
    let estimator = estimator(store.clone());

    let stats = estimator
        .update_rate_at("queue-1", 2.0, 0.3, t0())
        .await
        .unwrap();

    assert_eq!(stats.served_count, 1);
    assert_eq!(stats.ema_service_rate, 2.0);
    assert_eq!(stats.time_window, "2026-10-20T10");
    assert_eq!(stats.p50_wait_time_minutes, 3);
    assert_eq!(stats.p90_wait_time_minutes, 5);

    let stored = store.get("queue-1", "2026-10-20T10").await.unwrap();
    assert_eq!(stored, Some(stats));
}

#[tokio::test]
async fn test_second_observation_smooths_rate() {
    let estimator = estimator(Arc::new(InMemoryStatsStore::new()));

    estimator
        .update_rate_at("queue-1", 2.0, 0.3, t0())
        .await
        .unwrap();
    let stats = estimator
        .update_rate_at("queue-1", 4.0, 0.3, t0() + Duration::minutes(20))
        .await
        .unwrap();

    assert_eq!(stats.served_count, 2);
    assert!((stats.ema_service_rate - 2.6).abs() < 1e-9);
    assert_eq!(stats.window_start, t0());
    assert_eq!(stats.updated_at, t0() + Duration::minutes(20));
}

#[tokio::test]
async fn test_new_hour_starts_fresh_window() {
    let store = Arc::new(InMemoryStatsStore::new());
    let estimator = estimator(store.clone());

    estimator
        .update_rate_at("queue-1", 2.0, 0.3, t0())
        .await
        .unwrap();
    let next_hour = Utc.with_ymd_and_hms(2026, 10, 20, 11, 0, 0).unwrap();
    let stats = estimator
        .update_rate_at("queue-1", 6.0, 0.3, next_hour)
        .await
        .unwrap();

    assert_eq!(stats.served_count, 1);
    assert_eq!(stats.ema_service_rate, 6.0);

    let previous = store.get("queue-1", "2026-10-20T10").await.unwrap().unwrap();
    assert_eq!(previous.ema_service_rate, 2.0);
}

#[tokio::test]
async fn test_queues_are_independent() {
    let estimator = estimator(Arc::new(InMemoryStatsStore::new()));

    estimator
        .update_rate_at("queue-1", 2.0, 0.5, t0())
        .await
        .unwrap();
    let other = estimator
        .update_rate_at("queue-2", 8.0, 0.5, t0())
        .await
        .unwrap();

    assert_eq!(other.served_count, 1);
    assert_eq!(other.ema_service_rate, 8.0);
}

// =============================================================================
// Validation and failures
// =============================================================================

#[tokio::test]
async fn test_invalid_alpha_is_rejected() {
    let estimator = estimator(Arc::new(InMemoryStatsStore::new()));

    for alpha in [0.0, -0.1, 1.01, f64::NAN] {
        let result = estimator.update_rate_at("queue-1", 2.0, alpha, t0()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

#[tokio::test]
async fn test_negative_rate_is_rejected() {
    let estimator = estimator(Arc::new(InMemoryStatsStore::new()));

    let result = estimator.update_rate_at("queue-1", -1.0, 0.3, t0()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let estimator = estimator(Arc::new(FailingStatsStore));

    let result = estimator.update_rate_at("queue-1", 2.0, 0.3, t0()).await;
    assert!(matches!(result, Err(AppError::Store(_))));
}

#[tokio::test]
async fn test_noop_store_never_accumulates() {
    let estimator = estimator(Arc::new(NoopStatsStore));

    estimator
        .update_rate_at("queue-1", 2.0, 0.3, t0())
        .await
        .unwrap();
    let stats = estimator
        .update_rate_at("queue-1", 4.0, 0.3, t0())
        .await
        .unwrap();

    assert_eq!(stats.served_count, 1);
    assert_eq!(stats.ema_service_rate, 4.0);
}

// =============================================================================
// Throughput and lookups
// =============================================================================

#[tokio::test]
async fn test_record_throughput_converts_to_per_minute() {
    let store = Arc::new(InMemoryStatsStore::new());
    let estimator = estimator(store.clone());

    let stats = estimator
        .record_throughput("queue-1", 30, 600)
        .await
        .unwrap();

    assert!((stats.ema_service_rate - 3.0).abs() < 1e-9);
    assert_eq!(stats.served_count, 1);
}

#[tokio::test]
async fn test_record_throughput_rejects_empty_window() {
    let estimator = estimator(Arc::new(InMemoryStatsStore::new()));

    let result = estimator.record_throughput("queue-1", 5, 0).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_stats_or_defaults_without_record() {
    let estimator = estimator(Arc::new(InMemoryStatsStore::new()));

    let stats = estimator.stats_or_defaults("queue-1").await;

    assert_eq!(stats.served_count, 0);
    assert_eq!(stats.ema_service_rate, 1.0);
    assert_eq!(stats.p50_wait_time_minutes, 5);
    assert_eq!(stats.p90_wait_time_minutes, 10);
}

#[tokio::test]
async fn test_stats_or_defaults_on_store_failure() {
    let estimator = estimator(Arc::new(FailingStatsStore));

    let stats = estimator.stats_or_defaults("queue-1").await;

    assert_eq!(stats.served_count, 0);
    assert_eq!(stats.queue_id, "queue-1");
}

#[tokio::test]
async fn test_latest_stats_reads_current_window() {
    let store = Arc::new(InMemoryStatsStore::new());
    let estimator = estimator(store.clone());

    assert_eq!(estimator.latest_stats_at("queue-1", t0()).await.unwrap(), None);

    estimator
        .update_rate_at("queue-1", 2.0, 0.3, t0())
        .await
        .unwrap();
    let later_same_hour = t0() + Duration::minutes(59);
    let stats = estimator
        .latest_stats_at("queue-1", later_same_hour)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stats.time_window, time_window_for(later_same_hour));
}

#[tokio::test]
async fn test_clear_current_window() {
    let store = Arc::new(InMemoryStatsStore::new());
    let estimator = estimator(store.clone());

    estimator.record_throughput("queue-1", 10, 60).await.unwrap();
    assert!(estimator.latest_stats("queue-1").await.unwrap().is_some());

    estimator.clear_current_window("queue-1").await.unwrap();
    assert!(estimator.latest_stats("queue-1").await.unwrap().is_none());
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_ema_stays_between_previous_and_observed(
        previous in 0.0f64..100.0,
        observed in 0.0f64..100.0,
        alpha in 0.01f64..=1.0,
    ) {
        let seed = PercentileSeed { p50_minutes: 3, p90_minutes: 5 };
        let mut stats = EtaStats::fresh("q", "w", previous, seed, t0());
        stats.apply_observation(observed, alpha, t0());

        let low = previous.min(observed) - 1e-9;
        let high = previous.max(observed) + 1e-9;
        prop_assert!(stats.ema_service_rate >= low && stats.ema_service_rate <= high);
        prop_assert_eq!(stats.served_count, 2);
    }
}
