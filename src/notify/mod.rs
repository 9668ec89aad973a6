//! Notification boundary.
//!
//! The run hands its report to a [`Notifier`] backend:
//!
//! | Backend           | Description |
//! |-------------------|-------------|
//! | `log`             | Writes the message through `tracing` (default) |
//! | `twilio-whatsapp` | Sends a WhatsApp message via the Twilio REST API |
//!
//! Delivery is best effort. A failed delivery is logged and reported as
//! [`DeliveryStatus::Failed`]; it never changes the claim outcomes.

mod format;
mod log;
mod twilio;

pub use self::format::{format_config_error, format_report, format_skipped};
pub use self::log::LogNotifier;
pub use self::twilio::TwilioWhatsAppNotifier;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::orchestrator::RunReport;

/// External delivery capability.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable backend name (e.g. "log", "twilio-whatsapp").
    fn name(&self) -> &str;

    /// Deliver one message.
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Whether a message reached the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Format `report` and deliver it.
pub async fn deliver(notifier: &dyn Notifier, report: &RunReport) -> DeliveryStatus {
    send_message(notifier, &format_report(report)).await
}

/// Deliver a preformatted message, logging the outcome.
pub async fn send_message(notifier: &dyn Notifier, message: &str) -> DeliveryStatus {
    match notifier.send(message).await {
        Ok(()) => {
            tracing::info!(backend = notifier.name(), "Notification sent");
            DeliveryStatus::Delivered
        }
        Err(e) => {
            tracing::error!(backend = notifier.name(), error = %e, "Notification failed");
            DeliveryStatus::Failed(e.to_string())
        }
    }
}

/// Create a notifier from configuration.
///
/// Returns a [`TwilioWhatsAppNotifier`] when Twilio is configured and a
/// [`LogNotifier`] otherwise.
pub fn create_notifier(config: &NotifyConfig) -> Arc<dyn Notifier> {
    match &config.twilio {
        Some(twilio) => Arc::new(TwilioWhatsAppNotifier::new(twilio.clone())),
        None => Arc::new(LogNotifier),
    }
}
