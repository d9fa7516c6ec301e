//! Unit tests for notification dispatchers
//!
//! Tests dispatcher selection and outcomes that need no SMTP server.

use queue_eta::config::{NotificationConfig, NotifierKind};
use queue_eta::models::{
    NotificationChannel, NotificationOutcome, NotificationRequest, NotificationStatus,
};
use queue_eta::services::{create_dispatcher, EmailNotifier, NoopNotifier, NotificationDispatcher};

fn config(kind: NotifierKind, host: Option<&str>) -> NotificationConfig {
    NotificationConfig {
        kind,
        smtp_host: host.map(str::to_string),
        smtp_port: 587,
        smtp_username: None,
        smtp_password: None,
        from_address: "noreply@smartqueue.local".to_string(),
    }
}

fn request(channel: NotificationChannel, address: &str) -> NotificationRequest {
    NotificationRequest {
        ticket_id: "ticket-1".to_string(),
        channel,
        address: address.to_string(),
        message: "Pick up time is approaching".to_string(),
    }
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_create_dispatcher_noop() {
    let dispatcher = create_dispatcher(&config(NotifierKind::Noop, None));
    assert_eq!(dispatcher.name(), "noop");
}

#[test]
fn test_create_dispatcher_email() {
    let dispatcher = create_dispatcher(&config(NotifierKind::Email, Some("smtp.example.com")));
    assert_eq!(dispatcher.name(), "email");
}

// =============================================================================
// Outcomes
// =============================================================================

#[tokio::test]
async fn test_noop_accepts_as_pending() {
    let outcome = NoopNotifier
        .notify(&request(NotificationChannel::Email, "ana@customers.test"))
        .await;

    assert!(outcome.scheduled);
    assert_eq!(outcome.status, NotificationStatus::Pending);
    assert!(outcome.notification_id.is_some());
    assert!(outcome.dispatched());
}

#[tokio::test]
async fn test_email_push_channel_is_pending() {
    let notifier = EmailNotifier::new(&config(NotifierKind::Email, Some("smtp.example.com")));

    let outcome = notifier
        .notify(&request(NotificationChannel::Push, "device-token"))
        .await;

    assert_eq!(outcome.status, NotificationStatus::Pending);
    assert!(outcome.dispatched());
}

#[tokio::test]
async fn test_email_without_host_is_not_dispatched() {
    let notifier = EmailNotifier::new(&config(NotifierKind::Email, None));

    let outcome = notifier
        .notify(&request(NotificationChannel::Email, "ana@customers.test"))
        .await;

    assert!(!outcome.scheduled);
    assert_eq!(outcome.status, NotificationStatus::Failed);
    assert!(!outcome.dispatched());
}

#[tokio::test]
async fn test_email_bad_recipient_is_not_dispatched() {
    let notifier = EmailNotifier::new(&config(NotifierKind::Email, Some("smtp.example.com")));

    let outcome = notifier
        .notify(&request(NotificationChannel::Email, "not an address"))
        .await;

    assert!(!outcome.dispatched());
    assert!(outcome.message.contains("Invalid email recipient"));
}

#[test]
fn test_outcome_helpers() {
    let failed = NotificationOutcome::failed("boom");
    assert!(!failed.dispatched());
    assert_eq!(failed.notification_id, None);

    let sent = NotificationOutcome::scheduled(NotificationStatus::Sent, "id-1".to_string());
    assert!(sent.dispatched());
    assert_eq!(sent.message, "Notification scheduled successfully");
}
