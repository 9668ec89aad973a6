//! Aggregated result of one run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::claim::AccountResult;

/// All account results of a run, in input order, with their tallies.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub period_key: String,
    pub results: Vec<AccountResult>,
    pub success_count: usize,
    pub fail_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl RunReport {
    /// Build a report from results already in input order.
    pub fn new(run_id: Uuid, period_key: &str, results: Vec<AccountResult>) -> Self {
        let success_count = results.iter().filter(|r| r.is_success()).count();
        let fail_count = results.len() - success_count;
        Self {
            run_id,
            period_key: period_key.to_string(),
            results,
            success_count,
            fail_count,
            generated_at: Utc::now(),
        }
    }

    pub fn has_success(&self) -> bool {
        self.success_count > 0
    }
}
