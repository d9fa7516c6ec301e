use std::env;
use std::time::Duration;

/// Default message sent when a ticket crosses the notification threshold
pub const DEFAULT_READY_MESSAGE: &str =
    "Pick up time is approaching, please come to the counter to pick up your items";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub eta: EtaConfig,
    pub scheduler: SchedulerConfig,
    pub database: Option<DatabaseConfig>,
    pub notification: NotificationConfig,
}

/// Estimation parameters consumed by the rate estimator and the calculator
#[derive(Debug, Clone)]
pub struct EtaConfig {
    /// EMA smoothing factor, in (0, 1]
    pub ema_alpha: f64,
    /// Service rate (tickets per minute) used when a queue has no stats yet
    pub default_service_rate: f64,
    /// Placeholder percentiles reported when no stats record exists
    pub default_p50_minutes: i32,
    pub default_p90_minutes: i32,
    /// Percentiles a brand new stats window starts with
    pub window_seed_p50_minutes: i32,
    pub window_seed_p90_minutes: i32,
}

/// Ticket countdown scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub update_interval: Duration,
    pub notification_threshold_minutes: u32,
    /// Max tickets processed concurrently within one tick
    pub concurrency: usize,
    /// When true, a failed dispatch leaves `notification_sent` unset so a later tick retries
    pub retry_failed_notifications: bool,
    pub ready_message: String,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Which dispatcher delivers ready notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Noop,
    Email,
}

/// Notification dispatcher configuration
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub kind: NotifierKind,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            eta: EtaConfig::from_env()?,
            scheduler: SchedulerConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            notification: NotificationConfig::from_env()?,
        })
    }
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.3,
            default_service_rate: 1.0,
            default_p50_minutes: 5,
            default_p90_minutes: 10,
            window_seed_p50_minutes: 3,
            window_seed_p90_minutes: 5,
        }
    }
}

impl EtaConfig {
    /// Load estimation configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let ema_alpha: f64 = env::var("ETA_EMA_ALPHA")
            .unwrap_or_else(|_| defaults.ema_alpha.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAlpha)?;
        if !(ema_alpha > 0.0 && ema_alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha);
        }

        let default_service_rate: f64 = env::var("ETA_DEFAULT_SERVICE_RATE")
            .unwrap_or_else(|_| defaults.default_service_rate.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidServiceRate)?;
        if !(default_service_rate.is_finite() && default_service_rate > 0.0) {
            return Err(ConfigError::InvalidServiceRate);
        }

        Ok(Self {
            ema_alpha,
            default_service_rate,
            default_p50_minutes: env::var("ETA_DEFAULT_P50_MINUTES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(defaults.default_p50_minutes),
            default_p90_minutes: env::var("ETA_DEFAULT_P90_MINUTES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(defaults.default_p90_minutes),
            window_seed_p50_minutes: env::var("ETA_WINDOW_SEED_P50_MINUTES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(defaults.window_seed_p50_minutes),
            window_seed_p90_minutes: env::var("ETA_WINDOW_SEED_P90_MINUTES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(defaults.window_seed_p90_minutes),
        })
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(60_000),
            notification_threshold_minutes: 2,
            concurrency: 8,
            retry_failed_notifications: false,
            ready_message: DEFAULT_READY_MESSAGE.to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Load scheduler configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let interval_ms: u64 = env::var("ETA_SCHEDULER_UPDATE_INTERVAL_MS")
            .unwrap_or_else(|_| "60000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidInterval)?;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        let notification_threshold_minutes = env::var("ETA_NOTIFICATION_THRESHOLD_MINUTES")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidThreshold)?;

        Ok(Self {
            update_interval: Duration::from_millis(interval_ms),
            notification_threshold_minutes,
            concurrency: env::var("ETA_SCHEDULER_CONCURRENCY")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8)
                .max(1),
            retry_failed_notifications: env::var("ETA_RETRY_FAILED_NOTIFICATIONS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            ready_message: env::var("ETA_READY_MESSAGE")
                .unwrap_or_else(|_| DEFAULT_READY_MESSAGE.to_string()),
        })
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables.
    /// Returns None when DATABASE_URL is not set.
    pub fn from_env() -> Option<Self> {
        let url = env::var("DATABASE_URL").ok()?;

        Some(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

impl NotificationConfig {
    /// Load notifier configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let smtp_host = env::var("SMTP_HOST").ok();

        // Explicit NOTIFIER wins; otherwise email is used whenever SMTP is configured
        let kind = match env::var("NOTIFIER").ok().as_deref() {
            Some("email") => NotifierKind::Email,
            Some("noop") | Some("none") => NotifierKind::Noop,
            Some(_) => return Err(ConfigError::UnknownNotifier),
            None if smtp_host.is_some() => NotifierKind::Email,
            None => NotifierKind::Noop,
        };

        if kind == NotifierKind::Email && smtp_host.is_none() {
            return Err(ConfigError::MissingSmtpHost);
        }

        Ok(Self {
            kind,
            smtp_host,
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            from_address: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@smartqueue.local".to_string()),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidAlpha,
    InvalidServiceRate,
    InvalidInterval,
    InvalidThreshold,
    UnknownNotifier,
    MissingSmtpHost,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidAlpha => {
                write!(f, "ETA_EMA_ALPHA must be a number in (0, 1]")
            }
            ConfigError::InvalidServiceRate => {
                write!(f, "ETA_DEFAULT_SERVICE_RATE must be a positive number")
            }
            ConfigError::InvalidInterval => write!(
                f,
                "ETA_SCHEDULER_UPDATE_INTERVAL_MS must be a positive number of milliseconds"
            ),
            ConfigError::InvalidThreshold => write!(
                f,
                "ETA_NOTIFICATION_THRESHOLD_MINUTES must be a non-negative integer"
            ),
            ConfigError::UnknownNotifier => {
                write!(f, "NOTIFIER must be one of: email, noop")
            }
            ConfigError::MissingSmtpHost => {
                write!(f, "SMTP_HOST is required when NOTIFIER=email")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
