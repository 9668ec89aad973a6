//! CLI command handling.
//!
//! Provides subcommands for:
//! - Claiming the day's rewards for every account (`run`, the default)
//! - Showing marker, period and configuration status (`status`)

mod run;
mod status;

pub use run::run_claim_command;
pub use status::run_status_command;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "daily-claim")]
#[command(about = "Claims the daily login reward for every configured account")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Claim today's rewards (default if no subcommand given)
    Run(RunArgs),

    /// Show the current period, run marker and configuration
    Status,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Run even if today's period is already marked as done
    #[arg(long)]
    pub force: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Disable the console progress indicator
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// The command to execute, defaulting to `run`.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Run(RunArgs::default()))
    }
}
