use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Format of the hour bucket a stats record belongs to (UTC)
const TIME_WINDOW_FORMAT: &str = "%Y-%m-%dT%H";

/// Returns the UTC hour bucket for `at`, e.g. "2026-10-19T14"
pub fn time_window_for(at: DateTime<Utc>) -> String {
    at.format(TIME_WINDOW_FORMAT).to_string()
}

/// Returns the hour bucket for the current instant
pub fn current_time_window() -> String {
    time_window_for(Utc::now())
}

/// Percentile placeholders a new stats window starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentileSeed {
    pub p50_minutes: i32,
    pub p90_minutes: i32,
}

/// Smoothed service rate for one queue within one hour window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EtaStats {
    pub queue_id: String,
    pub time_window: String,
    pub served_count: i64,
    /// Tickets served per minute, exponentially smoothed
    pub ema_service_rate: f64,
    pub p90_wait_time_minutes: i32,
    pub p50_wait_time_minutes: i32,
    pub window_start: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EtaStats {
    /// First observation of a window. Nothing is carried over from earlier windows.
    pub fn fresh(
        queue_id: impl Into<String>,
        time_window: impl Into<String>,
        observed_rate: f64,
        seed: PercentileSeed,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            queue_id: queue_id.into(),
            time_window: time_window.into(),
            served_count: 1,
            ema_service_rate: observed_rate,
            p90_wait_time_minutes: seed.p90_minutes,
            p50_wait_time_minutes: seed.p50_minutes,
            window_start: now,
            updated_at: now,
        }
    }

    /// Folds one more observation into the EMA
    pub fn apply_observation(&mut self, observed_rate: f64, alpha: f64, now: DateTime<Utc>) {
        self.ema_service_rate = alpha * observed_rate + (1.0 - alpha) * self.ema_service_rate;
        self.served_count += 1;
        self.updated_at = now;
    }
}
