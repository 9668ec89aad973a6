//! `daily-claim run` - claim today's rewards for every account.

use std::io::IsTerminal;
use std::sync::Arc;

use chrono::Utc;

use crate::app::{DailyClaim, RunOutcome};
use crate::claim::HttpSessionProvider;
use crate::config::{Config, NotifyConfig};
use crate::guard::{FileMarkerStore, IdempotencyGuard};
use crate::notify::{self, LogNotifier, Notifier};
use crate::orchestrator::Orchestrator;

use super::RunArgs;

/// Run the claim command.
///
/// Configuration errors abort before any account is touched; a best-effort
/// notification describing the error is still attempted.
pub async fn run_claim_command(args: RunArgs) -> anyhow::Result<()> {
    let notifier: Arc<dyn Notifier> = match NotifyConfig::from_env() {
        Ok(config) => notify::create_notifier(&config),
        Err(e) => {
            tracing::error!(error = %e, "Invalid notification configuration");
            notify::send_message(&LogNotifier, &notify::format_config_error(&e)).await;
            return Err(e.into());
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            notify::send_message(notifier.as_ref(), &notify::format_config_error(&e)).await;
            return Err(e.into());
        }
    };
    tracing::info!(
        accounts = config.accounts.len(),
        notifier = notifier.name(),
        "Configuration loaded"
    );

    let provider = Arc::new(HttpSessionProvider::new(
        config.site.clone(),
        config.claim.request_timeout,
    ));
    let orchestrator = Orchestrator::new(provider, config.claim.worker_config(&config.site))
        .with_max_concurrency(config.claim.max_concurrency)
        .with_progress(!args.no_progress && !args.json && std::io::stderr().is_terminal());
    let guard = IdempotencyGuard::new(Arc::new(FileMarkerStore::new(
        config.claim.marker_path.clone(),
    )));

    let app = DailyClaim::new(
        guard,
        orchestrator,
        Arc::clone(&notifier),
        config.claim.tz_offset_hours,
    );
    let outcome = match app.run(&config.accounts, Utc::now(), args.force).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Invalid account list");
            notify::send_message(notifier.as_ref(), &notify::format_config_error(&e)).await;
            return Err(e.into());
        }
    };

    match outcome {
        RunOutcome::Skipped { period_key, .. } => {
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({"skipped": true, "period_key": period_key})
                );
            } else {
                println!("{}", notify::format_skipped(&period_key));
            }
        }
        RunOutcome::Completed { report, .. } => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", notify::format_report(&report));
            }
        }
    }

    Ok(())
}
