//! Email notification dispatcher.
//!
//! Sends the ready-for-pickup message over SMTP using the lettre crate.
//! Non-email channels are accepted as pending without delivery.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use super::NotificationDispatcher;
use crate::config::NotificationConfig;
use crate::models::{
    NotificationChannel, NotificationOutcome, NotificationRequest, NotificationStatus,
};

/// Subject line of every ready notification
pub const READY_SUBJECT: &str = "SmartQueue: Your order is coming";

/// SMTP email dispatcher
pub struct EmailNotifier {
    smtp_host: Option<String>,
    smtp_port: u16,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
    from_address: String,
}

impl EmailNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            smtp_username: config.smtp_username.clone(),
            smtp_password: config.smtp_password.clone(),
            from_address: config.from_address.clone(),
        }
    }

    /// Builds the message, rejecting unparsable addresses
    fn build_message(&self, request: &NotificationRequest) -> Result<Message, String> {
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|e| format!("Invalid sender address {}: {}", self.from_address, e))?;
        let to: Mailbox = request
            .address
            .parse()
            .map_err(|e| format!("Invalid email recipient {}: {}", request.address, e))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(READY_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(request.message.clone())
            .map_err(|e| format!("Failed to build email: {}", e))
    }

    /// Port 465 uses implicit TLS, anything else STARTTLS
    fn build_transport(&self, host: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>, String> {
        let builder = if self.smtp_port == 465 {
            let tls_params = TlsParameters::new(host.to_string())
                .map_err(|e| format!("Invalid TLS parameters for SMTP host: {}", e))?;
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map(|b| b.port(self.smtp_port).tls(Tls::Wrapper(tls_params)))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map(|b| b.port(self.smtp_port))
        };
        let builder = builder.map_err(|e| format!("Invalid SMTP host: {}", e))?;

        let transport = match (&self.smtp_username, &self.smtp_password) {
            (Some(username), Some(password)) => builder
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build(),
            _ => builder.build(),
        };

        Ok(transport)
    }
}

#[async_trait]
impl NotificationDispatcher for EmailNotifier {
    async fn notify(&self, request: &NotificationRequest) -> NotificationOutcome {
        let notification_id = Uuid::new_v4().to_string();
        log::info!(
            "Scheduling {} notification for ticket: {}",
            request.channel,
            request.ticket_id
        );

        if request.channel != NotificationChannel::Email {
            // Only email has a delivery backend
            return NotificationOutcome::scheduled(NotificationStatus::Pending, notification_id);
        }

        let host = match self.smtp_host.as_deref() {
            Some(h) => h,
            None => return NotificationOutcome::failed("SMTP host not configured"),
        };

        let email = match self.build_message(request) {
            Ok(email) => email,
            Err(message) => {
                log::warn!("{}", message);
                return NotificationOutcome::failed(message);
            }
        };

        let mailer = match self.build_transport(host) {
            Ok(mailer) => mailer,
            Err(message) => return NotificationOutcome::failed(message),
        };

        match mailer.send(email).await {
            Ok(_) => {
                log::debug!("Email sent successfully to {}", request.address);
                NotificationOutcome::scheduled(NotificationStatus::Sent, notification_id)
            }
            Err(e) => {
                log::error!(
                    "Error sending notification for ticket: {}: {}",
                    request.ticket_id,
                    e
                );
                NotificationOutcome::failed(format!(
                    "Failed to send email to {}: {}",
                    request.address, e
                ))
            }
        }
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
