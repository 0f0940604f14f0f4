//! Error types for the relay.
//!
//! Every relay error is converted into a [`RelayOutcome::Failed`] at the
//! orchestrator boundary, so nothing here ever reaches an HTTP client as a
//! raw fault.
//!
//! [`RelayOutcome::Failed`]: crate::relay::RelayOutcome::Failed

use thiserror::Error;

/// A record failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field or header
    pub field: String,
    /// What was wrong with it
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of an outbound HTTP call.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The call exceeded its timeout and was cancelled.
    #[error("Request timeout")]
    Timeout { timeout_ms: u64 },

    /// Connection, DNS, TLS or protocol failure.
    #[error("{0}")]
    Network(String),

    /// The target answered outside the accepted status range.
    #[error("Unexpected status code {status}")]
    NonSuccessStatus { status: u16 },

    /// The request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(String),
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout { .. })
    }
}

/// Reasons a single relay attempt can fail.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid webhook headers: {0}")]
    InvalidHeaders(ValidationError),

    #[error("Invalid relay request: {0}")]
    InvalidRequest(ValidationError),

    #[error("Invalid GitHub webhook signature")]
    Signature,

    #[error(transparent)]
    Request(#[from] RequestError),
}

impl RelayError {
    /// HTTP status the endpoint should answer with, when the failure implies one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RelayError::Signature => Some(401),
            _ => None,
        }
    }
}

/// Startup configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("targetJenkinsUrl is required")]
    MissingTargetUrl,

    #[error("webhookPath {0:?} must start with '/' and not be a built-in route")]
    InvalidWebhookPath(String),

    #[error("incomingPort must be between 1 and 65535, got {0}")]
    InvalidPort(i64),
}
