use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::EtaConfig;
use crate::error::{AppError, AppResult};
use crate::models::{time_window_for, EtaStats, PercentileSeed};
use crate::store::StatsStore;

/// Maintains the per-queue, per-hour EMA of observed service rate
#[derive(Clone)]
pub struct ServiceRateEstimator {
    stats: Arc<dyn StatsStore>,
    alpha: f64,
    default_service_rate: f64,
    default_p50_minutes: i32,
    default_p90_minutes: i32,
    seed: PercentileSeed,
}

impl ServiceRateEstimator {
    pub fn new(stats: Arc<dyn StatsStore>, config: &EtaConfig) -> Self {
        Self {
            stats,
            alpha: config.ema_alpha,
            default_service_rate: config.default_service_rate,
            default_p50_minutes: config.default_p50_minutes,
            default_p90_minutes: config.default_p90_minutes,
            seed: PercentileSeed {
                p50_minutes: config.window_seed_p50_minutes,
                p90_minutes: config.window_seed_p90_minutes,
            },
        }
    }

    /// The configured smoothing factor
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Folds `observed_rate` into the current hour window of `queue_id`
    pub async fn update_rate(
        &self,
        queue_id: &str,
        observed_rate: f64,
        alpha: f64,
    ) -> AppResult<EtaStats> {
        self.update_rate_at(queue_id, observed_rate, alpha, Utc::now())
            .await
    }

    /// Same as [`update_rate`](Self::update_rate) with an explicit clock
    pub async fn update_rate_at(
        &self,
        queue_id: &str,
        observed_rate: f64,
        alpha: f64,
        now: DateTime<Utc>,
    ) -> AppResult<EtaStats> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(AppError::Validation(format!(
                "alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        if !observed_rate.is_finite() || observed_rate < 0.0 {
            return Err(AppError::Validation(format!(
                "observed rate must be a non-negative number, got {}",
                observed_rate
            )));
        }

        log::debug!(
            "Updating service rate for queue: {} to {} with alpha: {}",
            queue_id,
            observed_rate,
            alpha
        );

        let time_window = time_window_for(now);
        let existing = self
            .stats
            .get(queue_id, &time_window)
            .await
            .map_err(|e| {
                log::error!(
                    "Error loading ETA stats for queue: {} window: {}: {}",
                    queue_id,
                    time_window,
                    e
                );
                e
            })?;

        let stats = match existing {
            Some(mut stats) => {
                stats.apply_observation(observed_rate, alpha, now);
                stats
            }
            None => EtaStats::fresh(queue_id, &time_window, observed_rate, self.seed, now),
        };

        self.stats.put(&stats).await.map_err(|e| {
            log::error!("Error saving ETA stats for queue: {}: {}", queue_id, e);
            e
        })?;

        Ok(stats)
    }

    /// Records `served_count` tickets served over `window_secs` seconds
    pub async fn record_throughput(
        &self,
        queue_id: &str,
        served_count: u32,
        window_secs: u32,
    ) -> AppResult<EtaStats> {
        log::info!(
            "Updating service stats for queueId: {}, served: {}, window: {}sec",
            queue_id,
            served_count,
            window_secs
        );

        if window_secs == 0 {
            return Err(AppError::Validation(
                "window_secs must be greater than zero".to_string(),
            ));
        }

        let rate = f64::from(served_count) / (f64::from(window_secs) / 60.0);
        self.update_rate(queue_id, rate, self.alpha).await
    }

    /// Stats for the current hour window of `queue_id`
    pub async fn latest_stats(&self, queue_id: &str) -> AppResult<Option<EtaStats>> {
        self.latest_stats_at(queue_id, Utc::now()).await
    }

    pub async fn latest_stats_at(
        &self,
        queue_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<EtaStats>> {
        self.stats.get(queue_id, &time_window_for(now)).await
    }

    /// Current stats, or the configured defaults when none exist or the read fails
    pub async fn stats_or_defaults(&self, queue_id: &str) -> EtaStats {
        let now = Utc::now();
        match self.latest_stats_at(queue_id, now).await {
            Ok(Some(stats)) => stats,
            Ok(None) => self.default_stats(queue_id, now),
            Err(e) => {
                log::error!("Error loading ETA stats for queue: {}: {}", queue_id, e);
                self.default_stats(queue_id, now)
            }
        }
    }

    /// Drops the current window's record for `queue_id`
    pub async fn clear_current_window(&self, queue_id: &str) -> AppResult<()> {
        let time_window = time_window_for(Utc::now());
        self.stats.delete(queue_id, &time_window).await?;
        log::info!("ETA stats deleted for queue: {} ({})", queue_id, time_window);
        Ok(())
    }

    fn default_stats(&self, queue_id: &str, now: DateTime<Utc>) -> EtaStats {
        EtaStats {
            queue_id: queue_id.to_string(),
            time_window: time_window_for(now),
            served_count: 0,
            ema_service_rate: self.default_service_rate,
            p90_wait_time_minutes: self.default_p90_minutes,
            p50_wait_time_minutes: self.default_p50_minutes,
            window_start: now,
            updated_at: now,
        }
    }
}
