use async_trait::async_trait;
use uuid::Uuid;

use super::NotificationDispatcher;
use crate::models::{NotificationOutcome, NotificationRequest, NotificationStatus};

/// Dispatcher used when no delivery backend is configured.
///
/// Accepts every request as pending without delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl NotificationDispatcher for NoopNotifier {
    async fn notify(&self, request: &NotificationRequest) -> NotificationOutcome {
        log::info!(
            "No notifier configured, recording {} notification for ticket {} as pending",
            request.channel,
            request.ticket_id
        );
        NotificationOutcome::scheduled(NotificationStatus::Pending, Uuid::new_v4().to_string())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
