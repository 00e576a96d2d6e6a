use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::models::errors::IndexerError;
use crate::utils::strip_html;

pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            exponential: 2.0,
        }
    }
}

/// Errors that tell the retry loop whether another attempt can help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for IndexerError {
    fn is_retryable(&self) -> bool {
        IndexerError::is_retryable(self)
    }
}

impl Retryable for anyhow::Error {
    fn is_retryable(&self) -> bool {
        true
    }
}

pub async fn retry<F, Fut, T, E>(operation: F, config: &RetryConfig, context: &str) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 1;
    let mut delay = config.base_delay_ms;
    let mut ceiling = config.base_delay_ms as f64;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                if attempt >= config.max_attempts {
                    error!(
                        "Operation '{}' failed after {} attempts. Final error: {}",
                        context,
                        attempt,
                        strip_html(&e.to_string())
                    );
                    return Err(e);
                }

                warn!(
                    "Attempt {}/{} for '{}' failed: {}. Retrying in {}ms...",
                    attempt,
                    config.max_attempts,
                    context,
                    strip_html(&e.to_string()),
                    delay
                );

                sleep(Duration::from_millis(delay)).await;

                // Exponential backoff with full jitter
                // https://aws.amazon.com/blogs/architecture/exponential-backoff-and-jitter/
                ceiling = (ceiling * config.exponential).min(config.max_delay_ms as f64);
                delay = (fastrand::f64() * ceiling) as u64;
                attempt += 1;
            }
        }
    }
}
