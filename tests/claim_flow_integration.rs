//! Integration tests for a full daily run: guard, orchestrator, workers and
//! notifier wired together the way the binary wires them.
//!
//! Uses an in-process fake of the reward site so no network is needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};

use daily_claim::app::{DailyClaim, RunOutcome};
use daily_claim::claim::{
    Account, ClaimForm, ClaimOutcome, ErrorKind, HttpReply, RewardSession, SessionProvider,
    WorkerConfig,
};
use daily_claim::error::{ClaimError, ConfigError, NotifyError};
use daily_claim::guard::{IdempotencyGuard, MarkerStore, MemoryMarkerStore};
use daily_claim::notify::Notifier;
use daily_claim::orchestrator::Orchestrator;

const HOME_URL: &str = "https://rewards.test/payment/pembayaran.php";
const LOGIN_URL: &str = "https://rewards.test/payment/server_.php";
const EVENT_URL: &str = "https://rewards.test/event/?event=daily";
const CLAIM_URL: &str = "https://rewards.test/event/index_.php?act=daily";
const PASSWORD: &str = "hunter2";
const VALID_SERVER: &str = "10";

// ---------------------------------------------------------------------------
// Fake reward site
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Reward {
    /// Claimable reward, `n` days claimed so far.
    Open(u32),
    /// Nothing left to claim, `n` days claimed so far.
    Taken(u32),
}

#[derive(Default)]
struct FakeSite {
    rewards: HashMap<String, Reward>,
    /// Logins answered with 429 before the site lets the user in.
    throttled_logins: Mutex<HashMap<String, u32>>,
    sessions_opened: AtomicUsize,
    claims_submitted: AtomicUsize,
}

impl FakeSite {
    fn with_reward(mut self, username: &str, reward: Reward) -> Self {
        self.rewards.insert(username.to_string(), reward);
        self
    }

    fn throttle_login(self, username: &str, times: u32) -> Self {
        self.throttled_logins
            .lock()
            .unwrap()
            .insert(username.to_string(), times);
        self
    }

    fn page(&self, username: &str) -> String {
        let (open, days) = match self.rewards.get(username) {
            Some(Reward::Open(days)) => (true, *days),
            Some(Reward::Taken(days)) => (false, *days),
            None => (false, 0),
        };
        let star = if open {
            r#"<div class="reward-item reward-star" data-id="31" data-period="202610"></div>"#
        } else {
            r#"<div class="reward-item claimed" data-id="31"></div>"#
        };
        format!(
            r#"<html><body><div class="header"><h5>You have claimed {days} days</h5></div>
            <div class="rewards">{star}</div></body></html>"#
        )
    }
}

struct FakeProvider {
    site: Arc<FakeSite>,
}

impl SessionProvider for FakeProvider {
    fn open(&self) -> Result<Box<dyn RewardSession>, ClaimError> {
        self.site.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            site: Arc::clone(&self.site),
            user: None,
        }))
    }
}

struct FakeSession {
    site: Arc<FakeSite>,
    user: Option<String>,
}

#[async_trait]
impl RewardSession for FakeSession {
    async fn login(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> Result<HttpReply, ClaimError> {
        {
            let mut throttled = self.site.throttled_logins.lock().unwrap();
            if let Some(left) = throttled.get_mut(username) {
                if *left > 0 {
                    *left -= 1;
                    return Ok(HttpReply::new(429, LOGIN_URL, "slow down"));
                }
            }
        }

        if password.expose_secret() == PASSWORD {
            self.user = Some(username.to_string());
            Ok(HttpReply::new(200, HOME_URL, "<html>welcome</html>"))
        } else {
            Ok(HttpReply::new(200, LOGIN_URL, "<html>wrong password</html>"))
        }
    }

    async fn reward_page(&mut self) -> Result<HttpReply, ClaimError> {
        let user = self.user.clone().unwrap_or_default();
        Ok(HttpReply::new(200, EVENT_URL, self.site.page(&user)))
    }

    async fn submit_claim(&mut self, form: &ClaimForm) -> Result<HttpReply, ClaimError> {
        self.site.claims_submitted.fetch_add(1, Ordering::SeqCst);
        let body = if form.server != VALID_SERVER {
            r#"{"message":"failed","data":"[-102] server not found"}"#
        } else if form.item_id != "31" || form.period_id != "202610" {
            r#"{"message":"failed","data":"Invalid item"}"#
        } else {
            r#"{"message":"success","data":"reward sent"}"#
        };
        Ok(HttpReply::new(200, CLAIM_URL, body))
    }
}

// ---------------------------------------------------------------------------
// Recording notifier
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(NotifyError::RequestFailed {
                backend: "recording".to_string(),
                reason: "channel down".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    app: DailyClaim,
    site: Arc<FakeSite>,
    store: Arc<MemoryMarkerStore>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(site: FakeSite, store: MemoryMarkerStore, notifier: RecordingNotifier) -> Harness {
    let site = Arc::new(site);
    let store = Arc::new(store);
    let notifier = Arc::new(notifier);

    let orchestrator = Orchestrator::new(
        Arc::new(FakeProvider {
            site: Arc::clone(&site),
        }),
        WorkerConfig {
            rate_limit_delay: Duration::from_millis(10),
            ..WorkerConfig::default()
        },
    );
    let guard = IdempotencyGuard::new(store.clone());
    let app = DailyClaim::new(guard, orchestrator, notifier.clone(), 7);

    Harness {
        app,
        site,
        store,
        notifier,
    }
}

/// 2026-10-18 10:00 at UTC+7.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap()
}

fn account(username: &str) -> Account {
    Account::new(username, PASSWORD, VALID_SERVER)
}

fn completed(outcome: RunOutcome) -> (daily_claim::orchestrator::RunReport, bool, bool) {
    match outcome {
        RunOutcome::Completed {
            report,
            marked,
            delivery,
        } => (report, marked, delivery.is_delivered()),
        RunOutcome::Skipped { period_key, .. } => panic!("run skipped for {period_key}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_accounts_claim_and_marker_is_written() {
    let site = FakeSite::default()
        .with_reward("alice@example.com", Reward::Open(5))
        .with_reward("bob", Reward::Open(5))
        .with_reward("carol", Reward::Open(5));
    let h = harness(site, MemoryMarkerStore::new(), RecordingNotifier::default());

    let accounts = vec![account("alice@example.com"), account("bob"), account("carol")];
    let (report, marked, delivered) = completed(h.app.run(&accounts, now(), false).await.unwrap());

    assert_eq!(report.period_key, "2026-10-18");
    assert_eq!(report.success_count, 3);
    assert_eq!(report.fail_count, 0);
    for result in &report.results {
        assert_eq!(result.outcome, ClaimOutcome::NewlyClaimed);
        assert_eq!(result.days_claimed_total, 6);
    }
    assert!(marked);
    assert!(delivered);
    assert_eq!(h.store.get().unwrap().as_deref(), Some("2026-10-18"));

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("alice: CLAIM COMPLETED, CLAIMED: 6/31 DAYS"));
    assert!(messages[0].contains("Summary: 3 succeeded, 0 failed"));
}

#[tokio::test]
async fn wrong_password_fails_only_that_account() {
    let site = FakeSite::default()
        .with_reward("alice", Reward::Open(2))
        .with_reward("mallory", Reward::Open(2))
        .with_reward("carol", Reward::Taken(9));
    let h = harness(site, MemoryMarkerStore::new(), RecordingNotifier::default());

    let accounts = vec![
        account("alice"),
        Account::new("mallory", "not-the-password", VALID_SERVER),
        account("carol"),
    ];
    let (report, marked, _) = completed(h.app.run(&accounts, now(), false).await.unwrap());

    let names: Vec<_> = report.results.iter().map(|r| r.username.as_str()).collect();
    assert_eq!(names, ["alice", "mallory", "carol"]);

    assert_eq!(report.results[0].outcome, ClaimOutcome::NewlyClaimed);
    assert_eq!(
        report.results[1].outcome,
        ClaimOutcome::Failed(ErrorKind::AuthError)
    );
    assert_eq!(report.results[1].days_claimed_total, 0);
    assert_eq!(report.results[2].outcome, ClaimOutcome::AlreadyClaimed);
    assert_eq!(report.results[2].days_claimed_total, 9);

    assert_eq!(report.success_count, 2);
    assert_eq!(report.fail_count, 1);
    assert!(marked);
    assert!(h.notifier.messages()[0].contains("1 failed attempt."));
}

#[tokio::test]
async fn server_mismatch_is_reported_and_run_still_notifies() {
    let site = FakeSite::default()
        .with_reward("alice", Reward::Open(0))
        .with_reward("dave", Reward::Open(0));
    let h = harness(site, MemoryMarkerStore::new(), RecordingNotifier::default());

    let accounts = vec![account("alice"), Account::new("dave", PASSWORD, "999")];
    let (report, marked, delivered) = completed(h.app.run(&accounts, now(), false).await.unwrap());

    assert_eq!(report.results[0].outcome, ClaimOutcome::NewlyClaimed);
    assert_eq!(report.results[0].days_claimed_total, 1);
    assert_eq!(
        report.results[1].outcome,
        ClaimOutcome::Failed(ErrorKind::InvalidServer)
    );
    assert_eq!(report.fail_count, 1);
    assert!(marked);
    assert!(delivered);
    assert!(h.notifier.messages()[0].contains("ERROR: InvalidServer"));
}

#[tokio::test]
async fn throttled_login_recovers_on_retry() {
    let site = FakeSite::default()
        .with_reward("alice", Reward::Open(3))
        .throttle_login("alice", 1);
    let h = harness(site, MemoryMarkerStore::new(), RecordingNotifier::default());

    let (report, _, _) = completed(h.app.run(&[account("alice")], now(), false).await.unwrap());

    assert_eq!(report.results[0].outcome, ClaimOutcome::NewlyClaimed);
    assert_eq!(report.results[0].days_claimed_total, 4);
    assert_eq!(report.success_count, 1);
}

#[tokio::test]
async fn persistent_throttling_is_rate_limited() {
    let site = FakeSite::default()
        .with_reward("alice", Reward::Open(3))
        .throttle_login("alice", 10);
    let h = harness(site, MemoryMarkerStore::new(), RecordingNotifier::default());

    let (report, marked, _) = completed(h.app.run(&[account("alice")], now(), false).await.unwrap());

    assert_eq!(
        report.results[0].outcome,
        ClaimOutcome::Failed(ErrorKind::RateLimited)
    );
    assert!(!marked);
}

#[tokio::test]
async fn already_marked_period_skips_without_touching_the_site() {
    let site = FakeSite::default().with_reward("alice", Reward::Open(3));
    let h = harness(
        site,
        MemoryMarkerStore::with_marker("2026-10-18"),
        RecordingNotifier::default(),
    );

    let outcome = h.app.run(&[account("alice")], now(), false).await.unwrap();

    match outcome {
        RunOutcome::Skipped {
            period_key,
            delivery,
        } => {
            assert_eq!(period_key, "2026-10-18");
            assert!(delivery.is_delivered());
        }
        RunOutcome::Completed { .. } => panic!("expected the run to be skipped"),
    }
    assert_eq!(h.site.sessions_opened.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.writes(), 0);
    assert_eq!(
        h.notifier.messages(),
        ["Daily claim skipped: already ran for 2026-10-18."]
    );
}

#[tokio::test]
async fn marker_from_yesterday_does_not_skip() {
    let site = FakeSite::default().with_reward("alice", Reward::Taken(17));
    let h = harness(
        site,
        MemoryMarkerStore::with_marker("2026-10-17"),
        RecordingNotifier::default(),
    );

    let (report, marked, _) = completed(h.app.run(&[account("alice")], now(), false).await.unwrap());

    assert_eq!(report.results[0].outcome, ClaimOutcome::AlreadyClaimed);
    assert!(marked);
    assert_eq!(h.store.get().unwrap().as_deref(), Some("2026-10-18"));
    assert_eq!(h.site.claims_submitted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn force_bypasses_the_marker() {
    let site = FakeSite::default().with_reward("alice", Reward::Taken(4));
    let h = harness(
        site,
        MemoryMarkerStore::with_marker("2026-10-18"),
        RecordingNotifier::default(),
    );

    let (report, _, _) = completed(h.app.run(&[account("alice")], now(), true).await.unwrap());

    assert_eq!(report.success_count, 1);
    assert_eq!(h.site.sessions_opened.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_successes_never_mark_the_period() {
    let h = harness(
        FakeSite::default(),
        MemoryMarkerStore::new(),
        RecordingNotifier::default(),
    );

    let accounts = vec![
        Account::new("a", "bad", VALID_SERVER),
        Account::new("b", "bad", VALID_SERVER),
    ];
    let (report, marked, _) = completed(h.app.run(&accounts, now(), false).await.unwrap());

    assert_eq!(report.success_count, 0);
    assert_eq!(report.fail_count, 2);
    assert!(!marked);
    assert_eq!(h.store.writes(), 0);
    assert_eq!(h.store.get().unwrap(), None);
    assert!(h.notifier.messages()[0].contains("2 failed attempts."));
}

#[tokio::test]
async fn counts_always_add_up_to_account_count() {
    let site = FakeSite::default()
        .with_reward("a", Reward::Open(1))
        .with_reward("b", Reward::Taken(1))
        .with_reward("d", Reward::Open(1))
        .throttle_login("e", 5);
    let h = harness(site, MemoryMarkerStore::new(), RecordingNotifier::default());

    let accounts = vec![
        account("a"),
        account("b"),
        Account::new("c", "bad", VALID_SERVER),
        Account::new("d", PASSWORD, "1"),
        account("e"),
    ];
    let (report, _, _) = completed(h.app.run(&accounts, now(), false).await.unwrap());

    assert_eq!(report.results.len(), accounts.len());
    assert_eq!(report.success_count + report.fail_count, accounts.len());
    assert_eq!(report.success_count, 2);
    assert_eq!(h.site.sessions_opened.load(Ordering::SeqCst), accounts.len());
}

#[tokio::test]
async fn notification_failure_does_not_change_outcomes() {
    let site = FakeSite::default().with_reward("alice", Reward::Open(0));
    let h = harness(site, MemoryMarkerStore::new(), RecordingNotifier::failing());

    let (report, marked, delivered) = completed(h.app.run(&[account("alice")], now(), false).await.unwrap());

    assert_eq!(report.results[0].outcome, ClaimOutcome::NewlyClaimed);
    assert!(marked);
    assert!(!delivered);
}

#[tokio::test]
async fn empty_account_list_is_rejected_before_the_run() {
    let h = harness(
        FakeSite::default(),
        MemoryMarkerStore::new(),
        RecordingNotifier::default(),
    );

    let err = h.app.run(&[], now(), false).await.unwrap_err();

    assert!(matches!(err, ConfigError::InvalidAccounts(_)));
    assert_eq!(h.site.sessions_opened.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.writes(), 0);
    assert!(h.notifier.messages().is_empty());
}
