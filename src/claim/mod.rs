//! Per-account claim flow.
//!
//! An [`AccountWorker`] opens one session per account through a
//! [`SessionProvider`], logs in, reads the reward page into a
//! [`RewardSnapshot`], submits the claim when one is available and reports an
//! [`AccountResult`]. Remote response formats are interpreted only in
//! [`classify`] and [`page`].

pub mod classify;
pub mod page;
pub mod session;
mod worker;

pub use session::{ClaimForm, HttpReply, HttpSessionProvider, RewardSession, SessionProvider};
pub use worker::{AccountWorker, WorkerConfig, WorkerState, days_claimed_total};

use secrecy::SecretString;
use serde::Serialize;

/// Credentials for one account on the reward site.
///
/// Identity key is `username`.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub password: SecretString,
    pub server: String,
}

impl Account {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            server: server.into(),
        }
    }
}

/// Reward page state captured once, before any claim is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSnapshot {
    /// Whether the page shows a claimable reward marker.
    pub claimable: bool,
    pub item_id: Option<String>,
    pub period_id: Option<String>,
    /// Days already claimed this period, from the page's progress indicator.
    pub days_claimed_so_far: u32,
}

/// Per-account error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    AuthError,
    InvalidServer,
    RewardMismatch,
    RateLimited,
    NetworkError,
    UnexpectedError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthError => "AuthError",
            Self::InvalidServer => "InvalidServer",
            Self::RewardMismatch => "RewardMismatch",
            Self::RateLimited => "RateLimited",
            Self::NetworkError => "NetworkError",
            Self::UnexpectedError => "UnexpectedError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one account's claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "kind", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// Nothing to claim this period; counts as success.
    AlreadyClaimed,
    NewlyClaimed,
    Failed(ErrorKind),
}

impl ClaimOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Final result for one account. Produced exactly once per run.
#[derive(Debug, Clone, Serialize)]
pub struct AccountResult {
    pub username: String,
    pub outcome: ClaimOutcome,
    /// Claimed days including today's claim. Zero for failures.
    pub days_claimed_total: u32,
    /// Failure reason for humans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AccountResult {
    pub fn succeeded(username: &str, outcome: ClaimOutcome, days_claimed_total: u32) -> Self {
        Self {
            username: username.to_string(),
            outcome,
            days_claimed_total,
            detail: None,
        }
    }

    pub fn failed(username: &str, kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            username: username.to_string(),
            outcome: ClaimOutcome::Failed(kind),
            days_claimed_total: 0,
            detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
