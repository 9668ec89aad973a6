//! Concurrent multi-account runs.
//!
//! The [`Orchestrator`] spawns one worker task per account behind a
//! semaphore, then joins the tasks in input order so the report lists
//! accounts exactly as they were given, whatever order they finish in.

mod progress;
mod report;

pub use progress::ProgressIndicator;
pub use report::RunReport;

use std::sync::Arc;

use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::claim::{Account, AccountResult, AccountWorker, ErrorKind, SessionProvider, WorkerConfig};

/// Fans accounts out to workers and gathers an ordered report.
pub struct Orchestrator {
    provider: Arc<dyn SessionProvider>,
    worker: WorkerConfig,
    max_concurrency: Option<usize>,
    show_progress: bool,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn SessionProvider>, worker: WorkerConfig) -> Self {
        Self {
            provider,
            worker,
            max_concurrency: None,
            show_progress: false,
        }
    }

    /// Cap the number of accounts in flight at once.
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Draw a console progress indicator while workers run.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Run every account and return the report for `period_key`.
    ///
    /// A worker task that dies (panics, is cancelled) is reported as
    /// `UnexpectedError` for its own account; siblings are unaffected.
    pub async fn run_all(&self, accounts: &[Account], period_key: &str) -> RunReport {
        let run_id = Uuid::new_v4();
        let limit = self
            .max_concurrency
            .unwrap_or(accounts.len())
            .clamp(1, accounts.len().max(1));
        tracing::info!(
            %run_id,
            period = period_key,
            accounts = accounts.len(),
            concurrency = limit,
            "Starting claim run"
        );

        let progress = self.show_progress.then(ProgressIndicator::start);
        let semaphore = Arc::new(Semaphore::new(limit));

        let handles: Vec<_> = accounts
            .iter()
            .cloned()
            .map(|account| {
                let semaphore = Arc::clone(&semaphore);
                let provider = Arc::clone(&self.provider);
                let config = self.worker.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    AccountWorker::new(provider, config).run(&account).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(accounts.len());
        for (account, handle) in accounts.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(
                        username = %account.username,
                        error = %e,
                        "Worker task failed"
                    );
                    AccountResult::failed(
                        &account.username,
                        ErrorKind::UnexpectedError,
                        format!("worker task failed: {e}"),
                    )
                }
            };
            results.push(result);
        }

        if let Some(progress) = progress {
            progress.stop().await;
        }

        let report = RunReport::new(run_id, period_key, results);
        tracing::info!(
            %run_id,
            succeeded = report.success_count,
            failed = report.fail_count,
            "Claim run finished"
        );
        report
    }
}
