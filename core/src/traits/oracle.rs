use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a completion provider.
///
/// `Overloaded` is the one retryable condition; callers wrap oracle calls
/// in a [`crate::providers::RetryPolicy`] to back off and try again.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("provider overloaded: {0}")]
    Overloaded(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("empty completion from provider")]
    Empty,
}

impl OracleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, OracleError::Overloaded(_))
    }
}

/// A text-completion oracle. Implementations choose model, sampling
/// temperature, and stop sequences, but must return the completion text
/// verbatim.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn request(&self, system: &str, prompt: &str) -> Result<String, OracleError>;
}
