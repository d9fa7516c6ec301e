use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use super::calculator::{EtaCalculator, EtaEstimate};
use super::rate::ServiceRateEstimator;
use crate::error::AppResult;
use crate::models::{EtaResponse, EtaStats, TicketEta};
use crate::scheduler::TicketLifecycle;
use crate::store::TicketStore;

/// Answers ETA requests and starts tracking new tickets.
///
/// Every public entry point returns an answer: store failures degrade to a
/// fallback estimate instead of reaching the caller.
pub struct EtaService {
    tickets: Arc<dyn TicketStore>,
    estimator: ServiceRateEstimator,
    calculator: EtaCalculator,
    lifecycle: Arc<TicketLifecycle>,
}

impl EtaService {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        estimator: ServiceRateEstimator,
        calculator: EtaCalculator,
        lifecycle: Arc<TicketLifecycle>,
    ) -> Self {
        Self {
            tickets,
            estimator,
            calculator,
            lifecycle,
        }
    }

    /// Estimates the wait for a position without tracking anything
    pub async fn calculate_eta(
        &self,
        queue_id: &str,
        ticket_id: &str,
        position: Option<u32>,
    ) -> EtaResponse {
        self.calculate_eta_at(queue_id, ticket_id, position, Utc::now())
            .await
    }

    pub async fn calculate_eta_at(
        &self,
        queue_id: &str,
        ticket_id: &str,
        position: Option<u32>,
        now: DateTime<Utc>,
    ) -> EtaResponse {
        log::info!(
            "Calculating ETA for queueId: {}, ticketId: {}, position: {:?}",
            queue_id,
            ticket_id,
            position
        );

        let position = match position {
            Some(position) => position,
            None => {
                log::warn!(
                    "No position for ticket {} in queue {}, using fallback ETA",
                    ticket_id,
                    queue_id
                );
                return to_response(queue_id, ticket_id, &self.calculator.fallback(None), now);
            }
        };

        let estimate = match self.estimator.latest_stats_at(queue_id, now).await {
            Ok(stats) => {
                let local_now = now.with_timezone(&Local).naive_local();
                let estimate = self
                    .calculator
                    .calculate(position, stats.as_ref(), local_now);
                log::info!(
                    "ETA calculated - Queue: {}, Position: {}, Rate: {:.2}, Wait: {}min",
                    queue_id,
                    position,
                    estimate.service_rate,
                    estimate.estimated_wait_minutes
                );
                estimate
            }
            Err(e) => {
                log::error!("Error calculating ETA for queue: {}: {}", queue_id, e);
                self.calculator.fallback(Some(position))
            }
        };

        to_response(queue_id, ticket_id, &estimate, now)
    }

    /// Returns the live countdown of a tracked ticket, or starts tracking it.
    ///
    /// A tracked ticket is advanced to `now` right away with the same routine
    /// the scheduler uses.
    pub async fn calculate_and_track_eta(
        &self,
        queue_id: &str,
        ticket_id: &str,
        contact_address: Option<String>,
        position: Option<u32>,
    ) -> EtaResponse {
        self.calculate_and_track_eta_at(queue_id, ticket_id, contact_address, position, Utc::now())
            .await
    }

    pub async fn calculate_and_track_eta_at(
        &self,
        queue_id: &str,
        ticket_id: &str,
        contact_address: Option<String>,
        position: Option<u32>,
        now: DateTime<Utc>,
    ) -> EtaResponse {
        let existing = match self.tickets.get(ticket_id).await {
            Ok(existing) => existing,
            Err(e) => {
                // Do not overwrite a possibly live countdown on a failed read
                log::error!("Error loading ticket {}: {}", ticket_id, e);
                return self.calculate_eta_at(queue_id, ticket_id, position, now).await;
            }
        };

        if let Some(mut ticket) = existing {
            if let Err(e) = self.lifecycle.advance(&mut ticket, now).await {
                // `ticket` is left at its last persisted state
                log::error!("Error updating ticket ETA: {}: {}", ticket_id, e);
            }
            log::info!(
                "Ticket {} tracked, live remainingMinutes: {}",
                ticket_id,
                ticket.remaining_minutes
            );
            let stats = self.estimator.stats_or_defaults(&ticket.queue_id).await;
            return EtaResponse::from_ticket(
                &ticket,
                stats.p50_wait_time_minutes,
                stats.p90_wait_time_minutes,
            );
        }

        let mut response = self.calculate_eta_at(queue_id, ticket_id, position, now).await;
        let ticket = TicketEta::new(
            ticket_id,
            queue_id,
            contact_address,
            response.estimated_wait_minutes,
            now,
        );

        match self.tickets.put(&ticket).await {
            Ok(()) => log::info!(
                "New ticket {} tracked with {} minutes ETA",
                ticket_id,
                response.estimated_wait_minutes
            ),
            Err(e) => log::error!("Failed to track ticket {}: {}", ticket_id, e),
        }

        response.remaining_minutes = Some(response.estimated_wait_minutes);
        response
    }

    /// Current stats for a queue, or configured defaults
    pub async fn latest_stats(&self, queue_id: &str) -> EtaStats {
        self.estimator.stats_or_defaults(queue_id).await
    }

    /// Feeds a throughput observation into the queue's rate estimate
    pub async fn record_throughput(
        &self,
        queue_id: &str,
        served_count: u32,
        window_secs: u32,
    ) -> AppResult<EtaStats> {
        self.estimator
            .record_throughput(queue_id, served_count, window_secs)
            .await
    }
}

fn to_response(
    queue_id: &str,
    ticket_id: &str,
    estimate: &EtaEstimate,
    now: DateTime<Utc>,
) -> EtaResponse {
    EtaResponse {
        queue_id: queue_id.to_string(),
        ticket_id: ticket_id.to_string(),
        estimated_wait_minutes: estimate.estimated_wait_minutes,
        remaining_minutes: None,
        p50_wait_minutes: estimate.p50_wait_minutes,
        p90_wait_minutes: estimate.p90_wait_minutes,
        service_rate: Some(estimate.service_rate),
        updated_at: now,
    }
}
