//! Daily reward claimer.
//!
//! Logs into the reward site with every configured account, claims the
//! day's reward if it is still available, and sends one summary message
//! per run. A per-period marker keeps repeated invocations on the same day
//! from touching the site again.

pub mod app;
pub mod claim;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod notify;
pub mod orchestrator;
