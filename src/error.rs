//! Error types for the daily claim runner.

use crate::claim::ErrorKind;

/// Configuration errors. Fatal, raised before any account is processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid account list: {0}")]
    InvalidAccounts(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while driving a single account.
///
/// Never crosses the account worker boundary: the worker turns it into a
/// [`ErrorKind`] plus a human-readable detail inside the account result.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Invalid login credentials: {reason}")]
    AuthFailed { reason: String },

    #[error("Invalid server ID")]
    InvalidServer,

    #[error("Reward/Period mismatch")]
    RewardMismatch,

    #[error("Rate limited during {step} after {attempts} attempt(s)")]
    RateLimited { step: &'static str, attempts: u32 },

    #[error("Network error during {step}: {reason}")]
    Network { step: &'static str, reason: String },

    #[error("Unexpected response during {step}: {reason}")]
    Unexpected { step: &'static str, reason: String },
}

impl ClaimError {
    /// Map onto the per-account error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthFailed { .. } => ErrorKind::AuthError,
            Self::InvalidServer => ErrorKind::InvalidServer,
            Self::RewardMismatch => ErrorKind::RewardMismatch,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Network { .. } => ErrorKind::NetworkError,
            Self::Unexpected { .. } => ErrorKind::UnexpectedError,
        }
    }
}

/// Errors reading or writing the once-per-period marker.
#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from a notification backend.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Request to {backend} failed: {reason}")]
    RequestFailed { backend: String, reason: String },

    #[error("{backend} rejected the message with HTTP {status}: {body}")]
    Rejected {
        backend: String,
        status: u16,
        body: String,
    },
}
