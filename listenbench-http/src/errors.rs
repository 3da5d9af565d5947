//! HTTP agent error types

use listenbench_core::ErrorKind;

/// Error type for agent construction and request execution
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Request cancelled")]
    Cancelled,
}

impl AgentError {
    /// Taxonomy bucket this error is aggregated under
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Build(_) | AgentError::InvalidUrl(_) => ErrorKind::Agent,
            _ => ErrorKind::Request,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentError::Timeout(err)
        } else if err.is_builder() {
            AgentError::Build(err)
        } else {
            AgentError::Network(err)
        }
    }
}
