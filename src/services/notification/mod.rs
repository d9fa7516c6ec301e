//! Ready-notification dispatchers.
//!
//! The scheduler only depends on [`NotificationDispatcher`]. Which
//! implementation backs it is decided once at startup from configuration.

pub mod email;
pub mod noop;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{NotificationConfig, NotifierKind};
use crate::models::{NotificationOutcome, NotificationRequest};

pub use email::EmailNotifier;
pub use noop::NoopNotifier;

/// Delivers a notification to a customer.
///
/// Implementations never return an error: every failure is reported through
/// the outcome so callers can decide whether to retry.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, request: &NotificationRequest) -> NotificationOutcome;

    /// Short name for log lines
    fn name(&self) -> &'static str;
}

/// Creates the dispatcher selected by configuration
pub fn create_dispatcher(config: &NotificationConfig) -> Arc<dyn NotificationDispatcher> {
    match config.kind {
        NotifierKind::Email => Arc::new(EmailNotifier::new(config)),
        NotifierKind::Noop => Arc::new(NoopNotifier),
    }
}
