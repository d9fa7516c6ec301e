use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StatsStore, TicketStore};
use crate::error::AppResult;
use crate::models::{EtaStats, TicketEta};

/// Process-local ticket store
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<String, TicketEta>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tickets, active or not
    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn get(&self, ticket_id: &str) -> AppResult<Option<TicketEta>> {
        Ok(self.tickets.read().await.get(ticket_id).cloned())
    }

    async fn list_active(&self) -> AppResult<Vec<TicketEta>> {
        let tickets = self.tickets.read().await;
        Ok(tickets.values().filter(|t| t.is_active()).cloned().collect())
    }

    async fn put(&self, ticket: &TicketEta) -> AppResult<()> {
        self.tickets
            .write()
            .await
            .insert(ticket.ticket_id.clone(), ticket.clone());
        Ok(())
    }

    async fn delete(&self, ticket_id: &str) -> AppResult<()> {
        self.tickets.write().await.remove(ticket_id);
        Ok(())
    }
}

/// Process-local stats store keyed by (queue, time window)
#[derive(Debug, Default)]
pub struct InMemoryStatsStore {
    stats: RwLock<HashMap<(String, String), EtaStats>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn get(&self, queue_id: &str, time_window: &str) -> AppResult<Option<EtaStats>> {
        let key = (queue_id.to_string(), time_window.to_string());
        Ok(self.stats.read().await.get(&key).cloned())
    }

    async fn put(&self, stats: &EtaStats) -> AppResult<()> {
        let key = (stats.queue_id.clone(), stats.time_window.clone());
        self.stats.write().await.insert(key, stats.clone());
        Ok(())
    }

    async fn delete(&self, queue_id: &str, time_window: &str) -> AppResult<()> {
        let key = (queue_id.to_string(), time_window.to_string());
        self.stats.write().await.remove(&key);
        Ok(())
    }
}
