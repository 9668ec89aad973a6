//! Session capability used by the account worker.
//!
//! A [`SessionProvider`] hands out one fresh [`RewardSession`] per account
//! attempt. Sessions report raw HTTP replies; deciding what a reply means is
//! left to [`crate::claim::classify`].

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::SiteConfig;
use crate::error::ClaimError;

/// Status, final URL (after redirects) and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub url: String,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            body: body.into(),
        }
    }
}

/// Form submitted to claim the day's reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimForm {
    pub item_id: String,
    pub period_id: String,
    pub server: String,
}

/// One logged-in browsing session on the reward site.
///
/// Transport failures (connect errors, timeouts) come back as
/// [`ClaimError::Network`]; any HTTP status is returned as data.
#[async_trait]
pub trait RewardSession: Send {
    async fn login(&mut self, username: &str, password: &SecretString)
    -> Result<HttpReply, ClaimError>;

    async fn reward_page(&mut self) -> Result<HttpReply, ClaimError>;

    async fn submit_claim(&mut self, form: &ClaimForm) -> Result<HttpReply, ClaimError>;
}

/// Produces a fresh session (own cookie jar) per account attempt.
pub trait SessionProvider: Send + Sync {
    fn open(&self) -> Result<Box<dyn RewardSession>, ClaimError>;
}

/// Sessions backed by `reqwest` with a per-session cookie store.
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    site: SiteConfig,
    timeout: Duration,
}

impl HttpSessionProvider {
    pub fn new(site: SiteConfig, timeout: Duration) -> Self {
        Self { site, timeout }
    }
}

impl SessionProvider for HttpSessionProvider {
    fn open(&self) -> Result<Box<dyn RewardSession>, ClaimError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| ClaimError::Unexpected {
                step: "session",
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Box::new(HttpSession {
            client,
            site: self.site.clone(),
        }))
    }
}

struct HttpSession {
    client: reqwest::Client,
    site: SiteConfig,
}

impl HttpSession {
    async fn read(
        response: Result<reqwest::Response, reqwest::Error>,
        step: &'static str,
    ) -> Result<HttpReply, ClaimError> {
        let response = response.map_err(|e| transport_error(step, e))?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(step, e))?;
        Ok(HttpReply { status, url, body })
    }
}

#[async_trait]
impl RewardSession for HttpSession {
    async fn login(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> Result<HttpReply, ClaimError> {
        let form = [
            ("txtuserid", username),
            ("txtpassword", password.expose_secret()),
        ];
        let response = self
            .client
            .post(&self.site.login_url)
            .form(&form)
            .send()
            .await;
        Self::read(response, "login").await
    }

    async fn reward_page(&mut self) -> Result<HttpReply, ClaimError> {
        let response = self.client.get(&self.site.event_url).send().await;
        Self::read(response, "reward page").await
    }

    async fn submit_claim(&mut self, form: &ClaimForm) -> Result<HttpReply, ClaimError> {
        let fields = [
            ("itemId", form.item_id.as_str()),
            ("periodId", form.period_id.as_str()),
            ("selserver", form.server.as_str()),
        ];
        let response = self
            .client
            .post(&self.site.claim_url)
            .form(&fields)
            .send()
            .await;
        Self::read(response, "claim").await
    }
}

fn transport_error(step: &'static str, e: reqwest::Error) -> ClaimError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    ClaimError::Network { step, reason }
}
