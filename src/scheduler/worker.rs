use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::lifecycle::{Advance, TicketLifecycle};
use crate::config::SchedulerConfig;
use crate::error::AppResult;
use crate::store::TicketStore;

/// Counters for one tick
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub fetched: usize,
    pub updated: usize,
    pub notified: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// The active set could not be fetched
    pub aborted: bool,
    /// Another tick was still running
    pub skipped: bool,
}

impl TickReport {
    fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }

    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    fn record(&mut self, ticket_id: &str, result: AppResult<Advance>) {
        match result {
            Ok(advance) => {
                if advance.notified() {
                    self.notified += 1;
                }
                match advance {
                    Advance::Unchanged => self.unchanged += 1,
                    Advance::Updated { .. } => self.updated += 1,
                    Advance::Removed { .. } => self.removed += 1,
                }
            }
            Err(e) => {
                log::error!(
                    "Error updating ticket ETA: {} ({}): {}",
                    ticket_id,
                    e.kind(),
                    e
                );
                self.failed += 1;
            }
        }
    }
}

/// Clears the in-progress flag when the tick ends, even on panic
struct TickGuard<'a>(&'a AtomicBool);

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickGuard(flag))
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodic countdown over every active ticket
pub struct TicketScheduler {
    tickets: Arc<dyn TicketStore>,
    lifecycle: Arc<TicketLifecycle>,
    interval: Duration,
    concurrency: usize,
    in_progress: AtomicBool,
}

impl TicketScheduler {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        lifecycle: Arc<TicketLifecycle>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            tickets,
            lifecycle,
            interval: config.update_interval,
            concurrency: config.concurrency.max(1),
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one pass over the active set using the current time
    pub async fn tick(&self) -> TickReport {
        self.tick_at(Utc::now()).await
    }

    /// Runs one pass over the active set as of `now`.
    ///
    /// A failure on one ticket is logged and counted; the rest of the batch
    /// still runs. Failing to fetch the active set aborts the pass.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let _guard = match TickGuard::acquire(&self.in_progress) {
            Some(guard) => guard,
            None => {
                log::warn!("Previous ETA update still running, skipping this tick");
                return TickReport::skipped();
            }
        };

        log::debug!("Running scheduled ETA update");

        let tickets = match self.tickets.list_active().await {
            Ok(tickets) => tickets,
            Err(e) => {
                log::error!("Error in scheduled ETA update: {}", e);
                return TickReport::aborted();
            }
        };

        log::info!("Processing {} active tickets", tickets.len());

        let mut report = TickReport {
            fetched: tickets.len(),
            ..TickReport::default()
        };

        let lifecycle = &self.lifecycle;
        let results: Vec<(String, AppResult<Advance>)> = stream::iter(tickets)
            .map(|mut ticket| async move {
                let result = lifecycle.advance(&mut ticket, now).await;
                (ticket.ticket_id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (ticket_id, result) in results {
            report.record(&ticket_id, result);
        }

        log::debug!(
            "ETA update finished: {} updated, {} notified, {} removed, {} failed",
            report.updated,
            report.notified,
            report.removed,
            report.failed
        );

        report
    }

    /// Ticks on a fixed interval until `shutdown` flips to true or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "Ticket scheduler started (interval: {}ms)",
            self.interval.as_millis()
        );

        let mut ticker = tokio::time::interval(self.interval);
        // Ticks run inline, so a slow pass delays the next one instead of stacking
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        log::info!("Ticket scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Starts [`run`](Self::run) on the tokio runtime
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
