//! Once-per-period gate for whole runs.
//!
//! The guard reads the marker once before a run and writes it once after a
//! run with at least one success. Workers never touch it.

mod store;

pub use store::{FileMarkerStore, MarkerStore, MemoryMarkerStore};

use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};

use crate::error::MarkerError;

/// Period key for `now`: the calendar date in a fixed UTC offset, `YYYY-MM-DD`.
pub fn period_key(now: DateTime<Utc>, offset_hours: i32) -> String {
    let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset).format("%Y-%m-%d").to_string()
}

/// Number of days in the month of a `YYYY-MM-DD` period key.
pub fn days_in_month(period_key: &str) -> Option<u32> {
    let date = NaiveDate::parse_from_str(period_key, "%Y-%m-%d").ok()?;
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(first_of_next.pred_opt()?.day())
}

/// Gates runs behind the persisted marker. Single reader and writer per process.
#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn MarkerStore>,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn MarkerStore>) -> Self {
        Self { store }
    }

    /// False iff the stored marker equals `period_key`.
    ///
    /// An unreadable marker is treated as absent so the run still happens.
    pub fn should_run(&self, period_key: &str) -> bool {
        match self.store.get() {
            Ok(Some(last)) => last != period_key,
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read run marker; assuming no prior run");
                true
            }
        }
    }

    /// Record that `period_key` has had a successful run.
    pub fn mark_ran(&self, period_key: &str) -> Result<(), MarkerError> {
        self.store.set(period_key)?;
        tracing::info!(period = period_key, "Run marker updated");
        Ok(())
    }

    /// Last recorded period, for status output.
    pub fn last_marked(&self) -> Result<Option<String>, MarkerError> {
        self.store.get()
    }
}
