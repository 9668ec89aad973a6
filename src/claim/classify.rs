//! Maps reward-site replies onto login verdicts, claim verdicts and the
//! per-account error taxonomy.

use serde::Deserialize;

use crate::claim::HttpReply;
use crate::error::ClaimError;

/// Marker the site puts in the claim reply when the server ID is unknown.
const INVALID_SERVER_MARKER: &str = "[-102]";
/// Marker for an item/period that does not match the current reward.
const MISMATCH_MARKER: &str = "invalid";
const SUCCESS_MESSAGE: &str = "success";

/// How a login attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginVerdict {
    Authenticated,
    /// Throttled by the site (HTTP 429); the caller may retry.
    RateLimited,
    Rejected(String),
}

/// Classify a login reply.
///
/// Only a reply that ends up on `destination` (after redirects) counts as a
/// successful login.
pub fn classify_login(reply: &HttpReply, destination: &str) -> LoginVerdict {
    match reply.status {
        429 => return LoginVerdict::RateLimited,
        403 => return LoginVerdict::Rejected("access forbidden (HTTP 403)".to_string()),
        _ => {}
    }

    let path = reply.url.split(['?', '#']).next().unwrap_or_default();
    if is_success_status(reply.status) && path.ends_with(destination) {
        LoginVerdict::Authenticated
    } else {
        LoginVerdict::Rejected(format!(
            "login landed on {} (HTTP {})",
            reply.url, reply.status
        ))
    }
}

/// Check the reward page reply and hand back its HTML.
pub fn check_page(reply: &HttpReply) -> Result<&str, ClaimError> {
    check_status(reply, "reward page")?;
    Ok(&reply.body)
}

/// What the site said about a claim submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimVerdict {
    /// The reward was granted by this submission.
    Claimed,
    /// The site accepted the request without granting anything new.
    NothingClaimed,
}

#[derive(Debug, Deserialize)]
struct ClaimReply {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Classify a claim reply.
///
/// The reply is JSON `{"message": ..., "data": ...}`. Server and reward
/// mismatches are reported in `data`; a granted reward has
/// `message == "success"`.
pub fn classify_claim(reply: &HttpReply) -> Result<ClaimVerdict, ClaimError> {
    check_status(reply, "claim")?;

    let parsed: ClaimReply =
        serde_json::from_str(&reply.body).map_err(|e| ClaimError::Unexpected {
            step: "claim",
            reason: format!("reply is not valid JSON: {e}"),
        })?;

    let data = match parsed.data {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    if data.contains(INVALID_SERVER_MARKER) {
        return Err(ClaimError::InvalidServer);
    }
    if data.to_lowercase().contains(MISMATCH_MARKER) {
        return Err(ClaimError::RewardMismatch);
    }

    if parsed.message.as_deref() == Some(SUCCESS_MESSAGE) {
        Ok(ClaimVerdict::Claimed)
    } else {
        tracing::warn!(
            message = parsed.message.as_deref().unwrap_or(""),
            data = data.as_str(),
            "Claim reply did not report success; treating as already claimed"
        );
        Ok(ClaimVerdict::NothingClaimed)
    }
}

fn check_status(reply: &HttpReply, step: &'static str) -> Result<(), ClaimError> {
    match reply.status {
        429 => Err(ClaimError::RateLimited { step, attempts: 1 }),
        s if is_success_status(s) => Ok(()),
        s => Err(ClaimError::Network {
            step,
            reason: format!("HTTP {s}"),
        }),
    }
}

fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}
