//! Configuration for the daily claim runner.
//!
//! Everything comes from environment variables (a `.env` file is honored).
//! Accounts are read from `DATA_JSON`, or from the file named by
//! `ACCOUNTS_FILE` when `DATA_JSON` is unset.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::claim::{Account, WorkerConfig};
use crate::error::ConfigError;

/// Main configuration for a claim run.
#[derive(Debug, Clone)]
pub struct Config {
    pub site: SiteConfig,
    pub claim: ClaimConfig,
    pub accounts: Vec<Account>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            site: SiteConfig::from_env()?,
            claim: ClaimConfig::from_env()?,
            accounts: load_accounts()?,
        })
    }
}

/// Reward site endpoints.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub login_url: String,
    pub event_url: String,
    pub claim_url: String,
    /// Path suffix a successful login redirects to.
    pub post_login_destination: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            login_url: "https://kageherostudio.com/payment/server_.php".to_string(),
            event_url: "https://kageherostudio.com/event/?event=daily".to_string(),
            claim_url: "https://kageherostudio.com/event/index_.php?act=daily".to_string(),
            post_login_destination: "pembayaran.php".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            login_url: optional_env("CLAIM_LOGIN_URL")?.unwrap_or(defaults.login_url),
            event_url: optional_env("CLAIM_EVENT_URL")?.unwrap_or(defaults.event_url),
            claim_url: optional_env("CLAIM_SUBMIT_URL")?.unwrap_or(defaults.claim_url),
            post_login_destination: optional_env("CLAIM_LOGIN_DESTINATION")?
                .unwrap_or(defaults.post_login_destination),
        })
    }
}

/// Claim run behavior.
#[derive(Debug, Clone)]
pub struct ClaimConfig {
    /// Cap on concurrently running accounts. `None` runs all at once.
    pub max_concurrency: Option<usize>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    pub rate_limit_retries: u32,
    pub rate_limit_delay: Duration,
    /// Offset from UTC of the timezone that defines a claim day.
    pub tz_offset_hours: i32,
    pub marker_path: PathBuf,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            request_timeout: Duration::from_secs(30),
            rate_limit_retries: 1,
            rate_limit_delay: Duration::from_secs(5),
            tz_offset_hours: 7,
            marker_path: default_marker_path(),
        }
    }
}

impl ClaimConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_concurrency: Option<usize> = optional_env("CLAIM_MAX_CONCURRENCY")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "CLAIM_MAX_CONCURRENCY".to_string(),
                message: format!("must be a positive integer: {e}"),
            })?;
        if max_concurrency == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "CLAIM_MAX_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let tz_offset_hours = parse_optional_env("CLAIM_TZ_OFFSET_HOURS", 7)?;
        if !(-12..=14).contains(&tz_offset_hours) {
            return Err(ConfigError::InvalidValue {
                key: "CLAIM_TZ_OFFSET_HOURS".to_string(),
                message: format!("{tz_offset_hours} is outside -12..=14"),
            });
        }

        Ok(Self {
            max_concurrency,
            request_timeout: Duration::from_secs(30),
            rate_limit_retries: parse_optional_env("CLAIM_RATE_LIMIT_RETRIES", 1)?,
            rate_limit_delay: Duration::from_secs(parse_optional_env(
                "CLAIM_RATE_LIMIT_DELAY_SECS",
                5,
            )?),
            tz_offset_hours,
            marker_path: optional_env("CLAIM_MARKER_PATH")?
                .map(PathBuf::from)
                .unwrap_or_else(default_marker_path),
        })
    }

    /// Worker settings derived from this config and the site config.
    pub fn worker_config(&self, site: &SiteConfig) -> WorkerConfig {
        WorkerConfig {
            post_login_destination: site.post_login_destination.clone(),
            rate_limit_retries: self.rate_limit_retries,
            rate_limit_delay: self.rate_limit_delay,
        }
    }
}

/// Notification channel configuration.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    pub twilio: Option<TwilioConfig>,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    /// WhatsApp-enabled sender number.
    pub from_number: String,
    pub to_number: String,
    pub api_base: String,
}

impl NotifyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let twilio = match (
            optional_env("TWILIO_SID")?,
            optional_env("TWILIO_AUTH_TOKEN")?,
            optional_env("TWILIO_WHATSAPP_NUMBER")?,
            optional_env("RECIPIENT_WHATSAPP_NUMBER")?,
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number), Some(to_number)) => {
                Some(TwilioConfig {
                    account_sid,
                    auth_token: SecretString::from(auth_token),
                    from_number,
                    to_number,
                    api_base: optional_env("TWILIO_API_BASE")?
                        .unwrap_or_else(|| "https://api.twilio.com".to_string()),
                })
            }
            (None, None, None, None) => None,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "TWILIO_*".to_string(),
                    message: "TWILIO_SID, TWILIO_AUTH_TOKEN, TWILIO_WHATSAPP_NUMBER and \
                              RECIPIENT_WHATSAPP_NUMBER must be set together"
                        .to_string(),
                });
            }
        };

        Ok(Self { twilio })
    }

    /// Name of the backend this config selects.
    pub fn backend(&self) -> &'static str {
        if self.twilio.is_some() {
            "twilio-whatsapp"
        } else {
            "log"
        }
    }
}

/// Default marker file location (~/.daily-claim/marker.json).
pub fn default_marker_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".daily-claim")
        .join("marker.json")
}

#[derive(Debug, Deserialize)]
struct AccountRecord {
    username: String,
    password: String,
    server: String,
}

/// Read the account list from `DATA_JSON` or `ACCOUNTS_FILE`.
pub fn load_accounts() -> Result<Vec<Account>, ConfigError> {
    if let Some(raw) = optional_env("DATA_JSON")? {
        return parse_accounts(&raw);
    }
    if let Some(path) = optional_env("ACCOUNTS_FILE")? {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        return parse_accounts(&raw);
    }
    Err(ConfigError::MissingEnvVar("DATA_JSON".to_string()))
}

/// Parse and validate a JSON account list.
///
/// The list must be a non-empty array of `{username, password, server}`
/// objects with non-empty, unique usernames.
pub fn parse_accounts(raw: &str) -> Result<Vec<Account>, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ConfigError::InvalidAccounts(format!("not valid JSON: {e}")))?;

    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        _ => {
            return Err(ConfigError::InvalidAccounts(
                "expected a JSON array of accounts".to_string(),
            ));
        }
    };
    if entries.is_empty() {
        return Err(ConfigError::InvalidAccounts(
            "account list is empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut accounts = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let record: AccountRecord = serde_json::from_value(entry)
            .map_err(|e| ConfigError::InvalidAccounts(format!("account #{idx}: {e}")))?;

        let username = record.username.trim().to_string();
        if username.is_empty() {
            return Err(ConfigError::InvalidAccounts(format!(
                "account #{idx}: username is empty"
            )));
        }
        if !seen.insert(username.clone()) {
            return Err(ConfigError::InvalidAccounts(format!(
                "account #{idx}: duplicate username {username}"
            )));
        }

        accounts.push(Account {
            username,
            password: SecretString::from(record.password),
            server: record.server.trim().to_string(),
        });
    }
    Ok(accounts)
}

// Helper functions

fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}
