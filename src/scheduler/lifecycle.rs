//! Decay and state transitions for a single tracked ticket.
//!
//! Both the periodic tick and the re-registration path go through
//! [`TicketLifecycle::advance`], so a ticket behaves the same regardless of
//! which one touches it first.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::config::SchedulerConfig;
use crate::error::AppResult;
use crate::models::{NotificationRequest, TicketEta, TicketStatus};
use crate::services::notification::NotificationDispatcher;
use crate::store::TicketStore;

/// What happened to a ticket during one advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Less than a minute elapsed, or the ticket is in a terminal state
    Unchanged,
    /// Decayed and persisted
    Updated { notified: bool },
    /// Reached zero, marked READY and deleted
    Removed { notified: bool },
}

impl Advance {
    pub fn notified(&self) -> bool {
        matches!(
            self,
            Advance::Updated { notified: true } | Advance::Removed { notified: true }
        )
    }
}

/// Knobs for the countdown
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub notification_threshold_minutes: u32,
    pub retry_failed_notifications: bool,
    pub ready_message: String,
}

impl From<&SchedulerConfig> for LifecycleSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            notification_threshold_minutes: config.notification_threshold_minutes,
            retry_failed_notifications: config.retry_failed_notifications,
            ready_message: config.ready_message.clone(),
        }
    }
}

/// Applies elapsed time to tickets and persists the result
pub struct TicketLifecycle {
    tickets: Arc<dyn TicketStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    settings: LifecycleSettings,
    /// Per-ticket locks held across reload, decay and persist
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TicketLifecycle {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            tickets,
            dispatcher,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Decays `ticket` to `now`, fires the ready-soon notification once,
    /// and persists or deletes the ticket.
    ///
    /// Callers advancing the same ticket are serialized, and the ticket is
    /// reloaded from the store under the lock, so the tick and re-registration
    /// never act on the same stale copy. On success `ticket` holds the new
    /// state; on error it holds the last persisted state.
    ///
    /// Nothing is written when less than a whole minute has passed since the
    /// ticket's last update.
    pub async fn advance(&self, ticket: &mut TicketEta, now: DateTime<Utc>) -> AppResult<Advance> {
        let lock = self.lock_for(&ticket.ticket_id).await;
        let result = {
            let _held = lock.lock().await;
            self.advance_locked(ticket, now).await
        };
        drop(lock);
        self.release_lock(&ticket.ticket_id).await;
        result
    }

    async fn advance_locked(&self, ticket: &mut TicketEta, now: DateTime<Utc>) -> AppResult<Advance> {
        match self.tickets.get(&ticket.ticket_id).await? {
            Some(current) => *ticket = current,
            None => {
                log::debug!("Ticket {} already retired", ticket.ticket_id);
                return Ok(Advance::Unchanged);
            }
        }

        if ticket.status.is_terminal() {
            log::debug!(
                "Ticket {} is {}, leaving countdown untouched",
                ticket.ticket_id,
                ticket.status
            );
            return Ok(Advance::Unchanged);
        }

        let mut next = ticket.clone();
        let remaining = match next.decay(now) {
            Some(remaining) => remaining,
            None => return Ok(Advance::Unchanged),
        };

        log::info!(
            "Updated ticket {}: {} minutes remaining",
            next.ticket_id,
            remaining
        );

        let mut notified = false;
        if next.should_notify(self.settings.notification_threshold_minutes) {
            let dispatched = self.send_ready_notification(&next).await;
            if dispatched || !self.settings.retry_failed_notifications {
                next.mark_notified()?;
                notified = true;
            } else {
                log::warn!(
                    "Ready notification for ticket {} not dispatched, retrying next tick",
                    next.ticket_id
                );
            }
        }

        if remaining == 0 {
            next.transition_to(TicketStatus::Ready)?;
            // Final snapshot is best effort, the delete is what retires the ticket
            if let Err(e) = self.tickets.put(&next).await {
                log::warn!(
                    "Failed to persist final state of ticket {}: {}",
                    next.ticket_id,
                    e
                );
            }
            self.tickets.delete(&next.ticket_id).await?;
            log::info!("Ticket {} is ready, removed from active set", next.ticket_id);
            *ticket = next;
            return Ok(Advance::Removed { notified });
        }

        self.tickets.put(&next).await?;
        *ticket = next;
        Ok(Advance::Updated { notified })
    }

    async fn lock_for(&self, ticket_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry(ticket_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Drops the ticket's lock once no other caller holds or waits on it
    async fn release_lock(&self, ticket_id: &str) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(ticket_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(ticket_id);
        }
    }

    /// Number of tickets with a live lock entry
    pub async fn locked_tickets(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Returns whether the ticket may be considered notified
    async fn send_ready_notification(&self, ticket: &TicketEta) -> bool {
        let address = match ticket.contact_address.as_deref() {
            Some(address) if !address.trim().is_empty() => address,
            _ => {
                log::warn!(
                    "Ticket {} has no contact address, skipping ready notification",
                    ticket.ticket_id
                );
                return true;
            }
        };

        log::info!(
            "Sending ready notification to {} for ticket {}",
            address,
            ticket.ticket_id
        );

        let request = NotificationRequest {
            ticket_id: ticket.ticket_id.clone(),
            channel: ticket.channel,
            address: address.to_string(),
            message: self.settings.ready_message.clone(),
        };

        let outcome = self.dispatcher.notify(&request).await;
        if !outcome.dispatched() {
            log::error!(
                "Failed to send ready notification for ticket {} via {}: {}",
                ticket.ticket_id,
                self.dispatcher.name(),
                outcome.message
            );
        }
        outcome.dispatched()
    }
}
