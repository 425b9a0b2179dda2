use kongre_core::InvalidField;
use serde::Deserialize;

/// Error body returned by the Kongre API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub code: String,
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Rejected locally; nothing was sent
    #[error("Invalid submission: {0}")]
    Invalid(#[from] InvalidField),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status} ({}): {}", body.code, body.error)]
    Api { status: u16, body: ApiErrorBody },

    #[error("Too many submissions, retry in {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The store refused the direct upload. The credential is spent; request a new one.
    #[error("Upload rejected by storage with status {status}: {message}")]
    Upload { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// Field named by a validation failure, local or remote
    pub fn field(&self) -> Option<&str> {
        match self {
            ClientError::Invalid(invalid) => Some(invalid.field),
            ClientError::Api { body, .. } => body.field.as_deref(),
            _ => None,
        }
    }

    /// Whether retrying the whole flow later can succeed without changing the input
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::RateLimited { .. } => true,
            ClientError::Upload { .. } => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
