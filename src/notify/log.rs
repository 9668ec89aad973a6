//! Notifier that writes messages to the log.
//!
//! Used when no external channel is configured, so the report still shows up
//! next to the run's other log lines.
use async_trait::async_trait;

use crate::error::NotifyError;
use crate::notify::Notifier;

/// Notifier that emits each message via `tracing`.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        for line in message.lines() {
            tracing::info!(target: "daily_claim::report", "{}", line);
        }
        Ok(())
    }
}
