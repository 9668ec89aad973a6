//! One daily run: gate, fan out, record, notify.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::claim::Account;
use crate::error::ConfigError;
use crate::guard::{IdempotencyGuard, period_key};
use crate::notify::{self, DeliveryStatus, Notifier};
use crate::orchestrator::{Orchestrator, RunReport};

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The period already had a successful run; no account was touched.
    Skipped {
        period_key: String,
        delivery: DeliveryStatus,
    },
    Completed {
        report: RunReport,
        /// Whether the period marker was written.
        marked: bool,
        delivery: DeliveryStatus,
    },
}

/// Wires the guard, orchestrator and notifier together.
pub struct DailyClaim {
    guard: IdempotencyGuard,
    orchestrator: Orchestrator,
    notifier: Arc<dyn Notifier>,
    tz_offset_hours: i32,
}

impl DailyClaim {
    pub fn new(
        guard: IdempotencyGuard,
        orchestrator: Orchestrator,
        notifier: Arc<dyn Notifier>,
        tz_offset_hours: i32,
    ) -> Self {
        Self {
            guard,
            orchestrator,
            notifier,
            tz_offset_hours,
        }
    }

    /// Run once for the period containing `now`.
    ///
    /// With `force`, the marker check is bypassed; the marker is still only
    /// written when at least one account succeeded. An empty account list is
    /// rejected before the marker is read.
    pub async fn run(
        &self,
        accounts: &[Account],
        now: DateTime<Utc>,
        force: bool,
    ) -> Result<RunOutcome, ConfigError> {
        if accounts.is_empty() {
            return Err(ConfigError::InvalidAccounts(
                "account list is empty".to_string(),
            ));
        }

        let period = period_key(now, self.tz_offset_hours);

        if !force && !self.guard.should_run(&period) {
            tracing::info!(period = %period, "Already ran for this period, skipping");
            let delivery =
                notify::send_message(self.notifier.as_ref(), &notify::format_skipped(&period))
                    .await;
            return Ok(RunOutcome::Skipped {
                period_key: period,
                delivery,
            });
        }

        let report = self.orchestrator.run_all(accounts, &period).await;

        let marked = if report.has_success() {
            match self.guard.mark_ran(&period) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(period = %period, error = %e, "Failed to write run marker");
                    false
                }
            }
        } else {
            tracing::warn!(period = %period, "No account succeeded; leaving run marker unchanged");
            false
        };

        let delivery = notify::deliver(self.notifier.as_ref(), &report).await;
        Ok(RunOutcome::Completed {
            report,
            marked,
            delivery,
        })
    }
}
