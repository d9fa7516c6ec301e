//! Ticket countdown model.
//!
//! A `TicketEta` is created when a customer joins a queue and is then decayed
//! minute by minute until it reaches zero, at which point it is marked READY
//! and removed from the active set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NotificationChannel;
use crate::error::{AppError, AppResult};

// =============================================================================
// Ticket Status
// =============================================================================

/// Lifecycle status of a tracked ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Waiting,
    Notified,
    Ready,
    /// Set by the queue service when the customer is served
    Completed,
    /// Set by the queue service when the customer leaves
    Cancelled,
}

impl TicketStatus {
    /// COMPLETED and CANCELLED are owned by the queue service; nothing here leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Cancelled)
    }

    /// Whether the countdown may move a ticket from `self` to `next`.
    ///
    /// Only WAITING -> NOTIFIED -> READY and WAITING -> READY are legal.
    /// Staying in the same non-terminal state is a no-op.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        match (self, next) {
            (Waiting, Notified) | (Notified, Ready) | (Waiting, Ready) => true,
            (a, b) if a == b => !a.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Waiting => write!(f, "WAITING"),
            TicketStatus::Notified => write!(f, "NOTIFIED"),
            TicketStatus::Ready => write!(f, "READY"),
            TicketStatus::Completed => write!(f, "COMPLETED"),
            TicketStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// One in-flight ticket and its live countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEta {
    pub ticket_id: String,
    pub queue_id: String,
    /// Where the ready notification goes (an email address for the email channel)
    pub contact_address: Option<String>,
    pub channel: NotificationChannel,
    pub remaining_minutes: u32,
    pub original_eta_minutes: u32,
    pub calculated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub notification_sent: bool,
    pub status: TicketStatus,
}

impl TicketEta {
    /// Creates a freshly tracked WAITING ticket
    pub fn new(
        ticket_id: impl Into<String>,
        queue_id: impl Into<String>,
        contact_address: Option<String>,
        eta_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            queue_id: queue_id.into(),
            contact_address,
            channel: NotificationChannel::Email,
            remaining_minutes: eta_minutes,
            original_eta_minutes: eta_minutes,
            calculated_at: now,
            updated_at: now,
            notification_sent: false,
            status: TicketStatus::Waiting,
        }
    }

    /// Whole minutes since the last persisted update. Clock skew counts as zero.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.updated_at).num_minutes().max(0)
    }

    /// Applies wall-clock decay.
    ///
    /// Returns the new remaining time, or `None` when less than a whole minute
    /// has passed, in which case the ticket is left untouched.
    pub fn decay(&mut self, now: DateTime<Utc>) -> Option<u32> {
        let elapsed = self.elapsed_minutes(now);
        if elapsed < 1 {
            return None;
        }

        let remaining = (i64::from(self.remaining_minutes) - elapsed).max(0);
        // remaining is within [0, u32::MAX] here
        self.remaining_minutes = remaining as u32;
        self.updated_at = now;
        Some(self.remaining_minutes)
    }

    /// True when the ready-soon notification is due
    pub fn should_notify(&self, threshold_minutes: u32) -> bool {
        self.remaining_minutes <= threshold_minutes
            && self.remaining_minutes > 0
            && !self.notification_sent
    }

    /// Moves the ticket to `next`, rejecting transitions outside the countdown state machine
    pub fn transition_to(&mut self, next: TicketStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Marks the ready-soon notification as handled
    pub fn mark_notified(&mut self) -> AppResult<()> {
        self.transition_to(TicketStatus::Notified)?;
        self.notification_sent = true;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.remaining_minutes > 0
    }
}

// =============================================================================
// ETA Response
// =============================================================================

/// Answer returned to callers asking for a ticket's ETA
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaResponse {
    pub queue_id: String,
    pub ticket_id: String,
    pub estimated_wait_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<u32>,
    pub p50_wait_minutes: i32,
    pub p90_wait_minutes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_rate: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl EtaResponse {
    /// Live view of an already tracked ticket
    pub fn from_ticket(ticket: &TicketEta, p50_wait_minutes: i32, p90_wait_minutes: i32) -> Self {
        Self {
            queue_id: ticket.queue_id.clone(),
            ticket_id: ticket.ticket_id.clone(),
            estimated_wait_minutes: ticket.original_eta_minutes,
            remaining_minutes: Some(ticket.remaining_minutes),
            p50_wait_minutes,
            p90_wait_minutes,
            service_rate: None,
            updated_at: ticket.updated_at,
        }
    }
}
