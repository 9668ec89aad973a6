//! Run status CLI command.
//!
//! Shows the current period, the stored run marker, the account list size
//! and which notification backend is configured.

use std::sync::Arc;

use chrono::Utc;

use crate::config::{ClaimConfig, NotifyConfig, default_marker_path, load_accounts};
use crate::guard::{FileMarkerStore, IdempotencyGuard, period_key};

/// Run the status command, printing run state.
pub async fn run_status_command() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    println!("Daily Claim Status");
    println!("==================\n");

    println!(
        "  Version:     {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let (tz_offset_hours, marker_path) = match ClaimConfig::from_env() {
        Ok(claim) => (claim.tz_offset_hours, claim.marker_path),
        Err(e) => {
            println!("  Config:      error ({})", e);
            (7, default_marker_path())
        }
    };

    let period = period_key(Utc::now(), tz_offset_hours);
    println!("  Period:      {} (UTC{:+})", period, tz_offset_hours);

    print!("  Marker:      ");
    let guard = IdempotencyGuard::new(Arc::new(FileMarkerStore::new(marker_path.clone())));
    match guard.last_marked() {
        Ok(Some(last)) if last == period => println!("done for today ({})", marker_path.display()),
        Ok(Some(last)) => println!("last run {} ({})", last, marker_path.display()),
        Ok(None) => println!("never run ({})", marker_path.display()),
        Err(e) => println!("unreadable ({}: {})", marker_path.display(), e),
    }

    print!("  Accounts:    ");
    match load_accounts() {
        Ok(accounts) => println!("{} configured", accounts.len()),
        Err(e) => println!("error ({})", e),
    }

    print!("  Notifier:    ");
    match NotifyConfig::from_env() {
        Ok(config) => println!("{}", config.backend()),
        Err(e) => println!("error ({})", e),
    }

    Ok(())
}
