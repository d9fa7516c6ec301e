use async_trait::async_trait;

use super::StatsStore;
use crate::error::AppResult;
use crate::models::EtaStats;

/// Stats store used when no stats backend is available.
///
/// Reads find nothing, so the calculator falls back to the default rate.
/// Writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatsStore;

#[async_trait]
impl StatsStore for NoopStatsStore {
    async fn get(&self, _queue_id: &str, _time_window: &str) -> AppResult<Option<EtaStats>> {
        Ok(None)
    }

    async fn put(&self, stats: &EtaStats) -> AppResult<()> {
        log::warn!(
            "Stats store disabled, dropping stats for queue {} ({})",
            stats.queue_id,
            stats.time_window
        );
        Ok(())
    }

    async fn delete(&self, queue_id: &str, _time_window: &str) -> AppResult<()> {
        log::warn!("Stats store disabled, skipping delete for queue {}", queue_id);
        Ok(())
    }
}
