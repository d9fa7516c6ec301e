//! Wires the stores, dispatcher, ETA service and scheduler together.
//!
//! The service and the scheduler share one [`TicketLifecycle`] and one ticket
//! store, so tickets tracked through [`EtaService`] are the ones the scheduler
//! counts down.

use std::sync::Arc;

use crate::config::{Config, EtaConfig, SchedulerConfig};
use crate::db;
use crate::error::AppResult;
use crate::scheduler::{LifecycleSettings, TicketLifecycle, TicketScheduler};
use crate::services::{
    create_dispatcher, EtaCalculator, EtaService, NotificationDispatcher, ServiceRateEstimator,
};
use crate::store::{
    InMemoryTicketStore, NoopStatsStore, PgStatsStore, PgTicketStore, StatsStore, TicketStore,
};

/// A fully wired engine
pub struct Engine {
    /// Request-facing entry point for ETA lookups and throughput reports
    pub service: Arc<EtaService>,
    pub scheduler: Arc<TicketScheduler>,
}

impl Engine {
    /// Builds the engine from configuration.
    ///
    /// With a database, tickets and stats live in Postgres. Without one,
    /// tickets are kept in memory and stats are not persisted.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let (tickets, stats): (Arc<dyn TicketStore>, Arc<dyn StatsStore>) = match &config.database
        {
            Some(database) => {
                let pool = db::connect(database).await?;
                if !db::schema_ready(&pool).await {
                    log::warn!("Engine tables not visible, scheduler ticks will abort until they are");
                }
                match db::active_ticket_count(&pool).await {
                    Ok(count) => log::info!("Resuming countdown for {} active tickets", count),
                    Err(e) => log::warn!("Could not count active tickets: {}", e),
                }
                let tickets: Arc<dyn TicketStore> = Arc::new(PgTicketStore::new(pool.clone()));
                let stats: Arc<dyn StatsStore> = Arc::new(PgStatsStore::new(pool));
                (tickets, stats)
            }
            None => {
                log::warn!(
                    "DATABASE_URL not set, tickets are kept in memory and service stats are not persisted"
                );
                let tickets: Arc<dyn TicketStore> = Arc::new(InMemoryTicketStore::new());
                let stats: Arc<dyn StatsStore> = Arc::new(NoopStatsStore);
                (tickets, stats)
            }
        };

        let dispatcher = create_dispatcher(&config.notification);
        log::info!("Using {} notifier", dispatcher.name());

        Ok(Self::assemble(
            tickets,
            stats,
            dispatcher,
            &config.eta,
            &config.scheduler,
        ))
    }

    /// Builds the engine over explicit collaborators
    pub fn assemble(
        tickets: Arc<dyn TicketStore>,
        stats: Arc<dyn StatsStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        eta: &EtaConfig,
        scheduler: &SchedulerConfig,
    ) -> Self {
        let lifecycle = Arc::new(TicketLifecycle::new(
            tickets.clone(),
            dispatcher,
            LifecycleSettings::from(scheduler),
        ));

        let service = EtaService::new(
            tickets.clone(),
            ServiceRateEstimator::new(stats, eta),
            EtaCalculator::new(eta),
            lifecycle.clone(),
        );

        Self {
            service: Arc::new(service),
            scheduler: Arc::new(TicketScheduler::new(tickets, lifecycle, scheduler)),
        }
    }
}
