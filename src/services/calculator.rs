//! Turns a queue position and a service rate into a customer-facing wait time.
//!
//! The raw rate is adjusted with time-of-day and weekend multipliers, and the
//! resulting wait is then adjusted for queue depth, day of week and a flat
//! safety margin. All multipliers stack.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::config::EtaConfig;
use crate::models::EtaStats;

/// Lowest service rate used for division, in tickets per minute
pub const MIN_SERVICE_RATE: f64 = 0.1;

const PEAK_HOUR_MULTIPLIER: f64 = 0.7;
const LUNCH_MULTIPLIER: f64 = 0.5;
const WEEKEND_RATE_MULTIPLIER: f64 = 0.8;
const EVENING_RUSH_MULTIPLIER: f64 = 1.2;

/// Positions deeper than this get the congestion penalty
const DEEP_QUEUE_POSITION: u32 = 10;
const DEEP_QUEUE_PENALTY: f64 = 1.1;
const SAFETY_MARGIN: f64 = 1.05;

/// Minutes per position used when live stats cannot be read
const FALLBACK_MINUTES_PER_POSITION: u32 = 5;
const FALLBACK_UNKNOWN_POSITION_MINUTES: u32 = 10;

/// Result of an ETA calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtaEstimate {
    pub estimated_wait_minutes: u32,
    pub p50_wait_minutes: i32,
    pub p90_wait_minutes: i32,
    /// The adjusted rate the estimate was derived from
    pub service_rate: f64,
}

/// Stateless ETA calculator
#[derive(Debug, Clone)]
pub struct EtaCalculator {
    default_service_rate: f64,
    default_p50_minutes: i32,
    default_p90_minutes: i32,
}

impl EtaCalculator {
    pub fn new(config: &EtaConfig) -> Self {
        Self {
            default_service_rate: config.default_service_rate,
            default_p50_minutes: config.default_p50_minutes,
            default_p90_minutes: config.default_p90_minutes,
        }
    }

    pub fn default_service_rate(&self) -> f64 {
        self.default_service_rate
    }

    /// Estimates the wait for `position` at local time `now`.
    ///
    /// `stats` is the queue's record for the current window, if any.
    pub fn calculate(
        &self,
        position: u32,
        stats: Option<&EtaStats>,
        now: NaiveDateTime,
    ) -> EtaEstimate {
        let (base_rate, p50, p90) = match stats {
            Some(s) => (
                s.ema_service_rate,
                s.p50_wait_time_minutes,
                s.p90_wait_time_minutes,
            ),
            None => (
                self.default_service_rate,
                self.default_p50_minutes,
                self.default_p90_minutes,
            ),
        };

        let service_rate = smart_service_rate(base_rate, now);
        let base_eta = f64::from(position) / service_rate;
        let final_eta = apply_smart_factors(base_eta, now, position);

        EtaEstimate {
            estimated_wait_minutes: round_up_minutes(final_eta),
            p50_wait_minutes: p50,
            p90_wait_minutes: p90,
            service_rate,
        }
    }

    /// Crude estimate used when live stats are unavailable
    pub fn fallback(&self, position: Option<u32>) -> EtaEstimate {
        let minutes = position
            .map(|p| p.saturating_mul(FALLBACK_MINUTES_PER_POSITION))
            .unwrap_or(FALLBACK_UNKNOWN_POSITION_MINUTES);

        EtaEstimate {
            estimated_wait_minutes: minutes,
            p50_wait_minutes: self.default_p50_minutes,
            p90_wait_minutes: self.default_p90_minutes,
            service_rate: self.default_service_rate,
        }
    }
}

/// Applies the time-of-day and weekend multipliers to `base_rate`.
/// Never returns less than [`MIN_SERVICE_RATE`].
pub fn smart_service_rate(base_rate: f64, now: NaiveDateTime) -> f64 {
    let time = now.time();
    let mut multiplier = 1.0;

    if is_peak_hour(time) {
        multiplier *= PEAK_HOUR_MULTIPLIER;
    }
    if is_lunch_time(time) {
        multiplier *= LUNCH_MULTIPLIER;
    }
    if is_weekend(now.weekday()) {
        multiplier *= WEEKEND_RATE_MULTIPLIER;
    }
    if is_evening_rush(time) {
        multiplier *= EVENING_RUSH_MULTIPLIER;
    }

    // f64::max also maps NaN to the floor
    (base_rate * multiplier).max(MIN_SERVICE_RATE)
}

/// Applies depth, day-of-week and safety adjustments to a raw ETA in minutes
pub fn apply_smart_factors(base_eta: f64, now: NaiveDateTime, position: u32) -> f64 {
    let mut eta = base_eta;

    if position > DEEP_QUEUE_POSITION {
        eta *= DEEP_QUEUE_PENALTY;
    }

    eta *= match now.weekday() {
        Weekday::Mon => 1.15,
        Weekday::Fri => 1.1,
        Weekday::Sat | Weekday::Sun => 0.9,
        _ => 1.0,
    };

    eta * SAFETY_MARGIN
}

/// ceil, floored at one minute
fn round_up_minutes(eta: f64) -> u32 {
    // `as` saturates for out-of-range floats
    eta.ceil().max(1.0) as u32
}

/// Strictly between `from` and `to` (both given as hour, minute)
fn between_exclusive(time: NaiveTime, from: (u32, u32), to: (u32, u32)) -> bool {
    is_after(time, from) && is_before(time, to)
}

fn is_after(time: NaiveTime, (hour, minute): (u32, u32)) -> bool {
    let secs = time.num_seconds_from_midnight();
    let bound = hour * 3600 + minute * 60;
    secs > bound || (secs == bound && time.nanosecond() > 0)
}

fn is_before(time: NaiveTime, (hour, minute): (u32, u32)) -> bool {
    time.num_seconds_from_midnight() < hour * 3600 + minute * 60
}

fn is_peak_hour(time: NaiveTime) -> bool {
    between_exclusive(time, (9, 0), (11, 0)) || between_exclusive(time, (14, 0), (16, 0))
}

fn is_lunch_time(time: NaiveTime) -> bool {
    between_exclusive(time, (12, 0), (13, 30))
}

fn is_evening_rush(time: NaiveTime) -> bool {
    between_exclusive(time, (18, 0), (20, 0))
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}
