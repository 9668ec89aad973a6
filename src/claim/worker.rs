//! Account worker: login, read the reward page, claim, verify.

use std::sync::Arc;
use std::time::Duration;

use crate::claim::classify::{self, ClaimVerdict, LoginVerdict};
use crate::claim::page::read_reward_page;
use crate::claim::{
    Account, AccountResult, ClaimForm, ClaimOutcome, RewardSession, RewardSnapshot,
    SessionProvider,
};
use crate::error::ClaimError;

/// Knobs for a single account attempt.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Path suffix the login redirect must land on.
    pub post_login_destination: String,
    /// Extra login attempts after an HTTP 429.
    pub rate_limit_retries: u32,
    /// Fixed delay before each retry.
    pub rate_limit_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            post_login_destination: "pembayaran.php".to_string(),
            rate_limit_retries: 1,
            rate_limit_delay: Duration::from_secs(5),
        }
    }
}

/// Where an account attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Init,
    Authenticating,
    AuthFailed,
    Authenticated,
    FetchingState,
    FetchFailed,
    StateRead,
    Claiming,
    ClaimFailed,
    Claimed,
    AlreadyClaimed,
    Verifying,
    Verified,
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AuthFailed
                | Self::FetchFailed
                | Self::ClaimFailed
                | Self::AlreadyClaimed
                | Self::Verified
        )
    }

    pub fn can_advance_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Init, Authenticating)
                | (Authenticating, AuthFailed | Authenticated)
                | (Authenticated, FetchingState)
                | (FetchingState, FetchFailed | StateRead)
                | (StateRead, Claiming)
                | (Claiming, ClaimFailed | Claimed | AlreadyClaimed)
                | (Claimed, Verifying)
                | (Verifying, Verified)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Authenticating => "authenticating",
            Self::AuthFailed => "auth_failed",
            Self::Authenticated => "authenticated",
            Self::FetchingState => "fetching_state",
            Self::FetchFailed => "fetch_failed",
            Self::StateRead => "state_read",
            Self::Claiming => "claiming",
            Self::ClaimFailed => "claim_failed",
            Self::Claimed => "claimed",
            Self::AlreadyClaimed => "already_claimed",
            Self::Verifying => "verifying",
            Self::Verified => "verified",
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Total claimed days after this run, from the pre-claim snapshot.
///
/// The page is not re-read after claiming, so a fresh claim adds one.
pub fn days_claimed_total(snapshot: &RewardSnapshot, outcome: ClaimOutcome) -> u32 {
    match outcome {
        ClaimOutcome::NewlyClaimed => snapshot.days_claimed_so_far + 1,
        ClaimOutcome::AlreadyClaimed | ClaimOutcome::Failed(_) => snapshot.days_claimed_so_far,
    }
}

/// Drives one account through the claim flow.
///
/// Owns its session and snapshot; shares nothing with other workers.
pub struct AccountWorker {
    provider: Arc<dyn SessionProvider>,
    config: WorkerConfig,
    state: WorkerState,
}

impl AccountWorker {
    pub fn new(provider: Arc<dyn SessionProvider>, config: WorkerConfig) -> Self {
        Self {
            provider,
            config,
            state: WorkerState::Init,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Run the claim flow for `account`. Failures end up inside the result.
    pub async fn run(&mut self, account: &Account) -> AccountResult {
        match self.drive(account).await {
            Ok((outcome, days)) => {
                tracing::info!(
                    username = %account.username,
                    state = %self.state,
                    days,
                    "Account finished"
                );
                AccountResult::succeeded(&account.username, outcome, days)
            }
            Err(err) => {
                let kind = err.kind();
                tracing::warn!(
                    username = %account.username,
                    state = %self.state,
                    %kind,
                    error = %err,
                    "Account failed"
                );
                AccountResult::failed(&account.username, kind, err.to_string())
            }
        }
    }

    async fn drive(&mut self, account: &Account) -> Result<(ClaimOutcome, u32), ClaimError> {
        self.advance(WorkerState::Authenticating, account);
        let mut session = match self.provider.open() {
            Ok(session) => session,
            Err(e) => return Err(self.fail(WorkerState::AuthFailed, account, e)),
        };
        if let Err(e) = self.authenticate(session.as_mut(), account).await {
            return Err(self.fail(WorkerState::AuthFailed, account, e));
        }
        self.advance(WorkerState::Authenticated, account);

        self.advance(WorkerState::FetchingState, account);
        let snapshot = match Self::read_state(session.as_mut()).await {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(self.fail(WorkerState::FetchFailed, account, e)),
        };
        self.advance(WorkerState::StateRead, account);

        self.advance(WorkerState::Claiming, account);
        if !snapshot.claimable {
            self.advance(WorkerState::AlreadyClaimed, account);
            let outcome = ClaimOutcome::AlreadyClaimed;
            return Ok((outcome, days_claimed_total(&snapshot, outcome)));
        }

        let verdict = match Self::claim(session.as_mut(), &snapshot, account).await {
            Ok(verdict) => verdict,
            Err(e) => return Err(self.fail(WorkerState::ClaimFailed, account, e)),
        };
        if verdict == ClaimVerdict::NothingClaimed {
            self.advance(WorkerState::AlreadyClaimed, account);
            let outcome = ClaimOutcome::AlreadyClaimed;
            return Ok((outcome, days_claimed_total(&snapshot, outcome)));
        }
        self.advance(WorkerState::Claimed, account);

        self.advance(WorkerState::Verifying, account);
        let outcome = ClaimOutcome::NewlyClaimed;
        let days = days_claimed_total(&snapshot, outcome);
        self.advance(WorkerState::Verified, account);
        Ok((outcome, days))
    }

    /// Log in, retrying only on throttling and only within the retry budget.
    async fn authenticate(
        &self,
        session: &mut dyn RewardSession,
        account: &Account,
    ) -> Result<(), ClaimError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let reply = session.login(&account.username, &account.password).await?;
            match classify::classify_login(&reply, &self.config.post_login_destination) {
                LoginVerdict::Authenticated => return Ok(()),
                LoginVerdict::Rejected(reason) => return Err(ClaimError::AuthFailed { reason }),
                LoginVerdict::RateLimited if attempts <= self.config.rate_limit_retries => {
                    tracing::warn!(
                        username = %account.username,
                        attempt = attempts,
                        delay_ms = self.config.rate_limit_delay.as_millis() as u64,
                        "Login throttled, retrying after delay"
                    );
                    tokio::time::sleep(self.config.rate_limit_delay).await;
                }
                LoginVerdict::RateLimited => {
                    return Err(ClaimError::RateLimited {
                        step: "login",
                        attempts,
                    });
                }
            }
        }
    }

    async fn read_state(session: &mut dyn RewardSession) -> Result<RewardSnapshot, ClaimError> {
        let reply = session.reward_page().await?;
        read_reward_page(classify::check_page(&reply)?)
    }

    async fn claim(
        session: &mut dyn RewardSession,
        snapshot: &RewardSnapshot,
        account: &Account,
    ) -> Result<ClaimVerdict, ClaimError> {
        let (Some(item_id), Some(period_id)) = (&snapshot.item_id, &snapshot.period_id) else {
            return Err(ClaimError::Unexpected {
                step: "claim",
                reason: "reward marker has no item or period id".to_string(),
            });
        };
        let form = ClaimForm {
            item_id: item_id.clone(),
            period_id: period_id.clone(),
            server: account.server.clone(),
        };
        let reply = session.submit_claim(&form).await?;
        classify::classify_claim(&reply)
    }

    fn advance(&mut self, next: WorkerState, account: &Account) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid worker transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(
            username = %account.username,
            from = %self.state,
            to = %next,
            "Worker transition"
        );
        self.state = next;
    }

    fn fail(&mut self, terminal: WorkerState, account: &Account, err: ClaimError) -> ClaimError {
        self.advance(terminal, account);
        err
    }
}
