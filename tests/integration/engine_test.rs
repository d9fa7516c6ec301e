//! Integration tests for engine wiring
//!
//! Checks that tickets tracked through the service are the ones the scheduler
//! counts down.

use std::sync::Arc;

use chrono::Duration;
use pretty_assertions::assert_eq;

use queue_eta::config::{
    Config, EtaConfig, NotificationConfig, NotifierKind, SchedulerConfig,
};
use queue_eta::engine::Engine;
use queue_eta::models::TicketStatus;
use queue_eta::store::{InMemoryStatsStore, TicketStore};

use crate::common::{t0, RecordingNotifier, TestTicketStore};

fn memory_config() -> Config {
    Config {
        eta: EtaConfig::default(),
        scheduler: SchedulerConfig::default(),
        database: None,
        notification: NotificationConfig {
            kind: NotifierKind::Noop,
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from_address: "noreply@smartqueue.local".to_string(),
        },
    }
}

#[tokio::test]
async fn test_engine_without_database_counts_down_tracked_tickets() {
    let engine = Engine::from_config(&memory_config()).await.unwrap();

    let response = engine
        .service
        .calculate_and_track_eta_at("queue-1", "t-1", None, None, t0())
        .await;
    assert_eq!(response.remaining_minutes, Some(10));

    let report = engine.scheduler.tick_at(t0() + Duration::minutes(4)).await;
    assert_eq!(report.fetched, 1);
    assert_eq!(report.updated, 1);

    let again = engine
        .service
        .calculate_and_track_eta_at("queue-1", "t-1", None, None, t0() + Duration::minutes(4))
        .await;
    assert_eq!(again.remaining_minutes, Some(6));

    let report = engine.scheduler.tick_at(t0() + Duration::minutes(10)).await;
    assert_eq!(report.removed, 1);

    let report = engine.scheduler.tick_at(t0() + Duration::minutes(11)).await;
    assert_eq!(report.fetched, 0);
}

#[tokio::test]
async fn test_assembled_engine_shares_store_and_notifier() {
    let tickets = TestTicketStore::new();
    let notifier = RecordingNotifier::new();
    let engine = Engine::assemble(
        tickets.clone(),
        Arc::new(InMemoryStatsStore::new()),
        notifier.clone(),
        &EtaConfig::default(),
        &SchedulerConfig::default(),
    );

    engine
        .service
        .calculate_and_track_eta_at(
            "queue-1",
            "t-1",
            Some("ana@customers.test".to_string()),
            None,
            t0(),
        )
        .await;

    let report = engine.scheduler.tick_at(t0() + Duration::minutes(8)).await;
    assert_eq!(report.notified, 1);
    assert_eq!(notifier.count(), 1);
    assert_eq!(notifier.requests()[0].address, "ana@customers.test");

    let report = engine.scheduler.tick_at(t0() + Duration::minutes(10)).await;
    assert_eq!(report.removed, 1);
    assert_eq!(report.notified, 0);
    assert!(tickets.get("t-1").await.unwrap().is_none());
    assert_eq!(tickets.last_put("t-1").unwrap().status, TicketStatus::Ready);
}
