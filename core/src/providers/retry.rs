use crate::traits::{Oracle, OracleError};
use std::time::Duration;
use tracing::warn;

/// Bounded retry for provider calls. Only the `Overloaded` signal is
/// retried, with a fixed delay between attempts; every other error is
/// propagated immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub async fn request(
        &self,
        oracle: &dyn Oracle,
        system: &str,
        prompt: &str,
    ) -> Result<String, OracleError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match oracle.request(system, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(attempt, error = %e, "provider overloaded, backing off");
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
