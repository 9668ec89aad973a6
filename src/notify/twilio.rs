//! WhatsApp delivery through the Twilio Messages API.
//!
//! POSTs `From`/`To`/`Body` as a form to
//! `{api_base}/2010-04-01/Accounts/{sid}/Messages.json` with basic auth.
//! Twilio answers `201 Created` when the message is queued.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::TwilioConfig;
use crate::error::NotifyError;
use crate::notify::Notifier;

const BACKEND: &str = "twilio-whatsapp";

pub struct TwilioWhatsAppNotifier {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioWhatsAppNotifier {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioWhatsAppNotifier {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let from = format!("whatsapp:{}", self.config.from_number);
        let to = format!("whatsapp:{}", self.config.to_number);
        let form = [("From", from.as_str()), ("To", to.as_str()), ("Body", message)];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::RequestFailed {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() == 201 {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            backend: BACKEND.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
