//! Persistence collaborators.
//!
//! The engine only talks to these traits. Concrete backends are an in-memory
//! map (local runs and tests), Postgres via sqlx, and an explicit no-op stats
//! store used when stats persistence is disabled.

pub mod memory;
pub mod noop;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{EtaStats, TicketEta};

pub use memory::{InMemoryStatsStore, InMemoryTicketStore};
pub use noop::NoopStatsStore;
pub use postgres::{PgStatsStore, PgTicketStore};

/// Storage for tracked tickets
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Loads one ticket. A missing ticket is `Ok(None)`.
    async fn get(&self, ticket_id: &str) -> AppResult<Option<TicketEta>>;

    /// All tickets whose remaining time is above zero
    async fn list_active(&self) -> AppResult<Vec<TicketEta>>;

    /// Inserts or replaces the ticket (last write wins)
    async fn put(&self, ticket: &TicketEta) -> AppResult<()>;

    /// Removes the ticket. Deleting an unknown id is not an error.
    async fn delete(&self, ticket_id: &str) -> AppResult<()>;
}

/// Storage for per-queue, per-hour service rate statistics
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn get(&self, queue_id: &str, time_window: &str) -> AppResult<Option<EtaStats>>;

    async fn put(&self, stats: &EtaStats) -> AppResult<()>;

    async fn delete(&self, queue_id: &str, time_window: &str) -> AppResult<()>;
}
