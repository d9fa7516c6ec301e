//! Notification models shared by the scheduler and the dispatchers.

use serde::{Deserialize, Serialize};

// =============================================================================
// Channel
// =============================================================================

/// Delivery channel for a customer notification
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    #[default]
    Email,
    Sms,
    Push,
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationChannel::Email => write!(f, "email"),
            NotificationChannel::Sms => write!(f, "sms"),
            NotificationChannel::Push => write!(f, "push"),
        }
    }
}

// =============================================================================
// Request / Outcome
// =============================================================================

/// A request to notify one customer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub ticket_id: String,
    pub channel: NotificationChannel,
    pub address: String,
    pub message: String,
}

/// Delivery status reported by a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// Accepted but not delivered by this process
    Pending,
    Sent,
    Failed,
}

/// Result of a notification attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub scheduled: bool,
    pub status: NotificationStatus,
    pub notification_id: Option<String>,
    pub message: String,
}

impl NotificationOutcome {
    /// Notification accepted with the given status
    pub fn scheduled(status: NotificationStatus, notification_id: String) -> Self {
        Self {
            scheduled: true,
            status,
            notification_id: Some(notification_id),
            message: "Notification scheduled successfully".to_string(),
        }
    }

    /// Notification could not be scheduled
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            scheduled: false,
            status: NotificationStatus::Failed,
            notification_id: None,
            message: message.into(),
        }
    }

    /// Whether the dispatcher accepted the request
    pub fn dispatched(&self) -> bool {
        self.scheduled && self.status != NotificationStatus::Failed
    }
}
