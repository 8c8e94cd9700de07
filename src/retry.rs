//! Bounded retry loop with rate-limit backoff
//!
//! Upstream faults are classified into an explicit `Attempt` value instead
//! of being propagated; the loop decides whether to wait and try again.

use crate::config::MarketDataConfig;
use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Result of a single upstream attempt
#[derive(Debug)]
pub enum Attempt<T> {
    /// Usable payload
    Success(T),
    /// Upstream answered but with nothing usable; terminal, never retried
    Empty,
    /// Upstream signalled throttling
    RateLimited,
    /// Any other fault (network, parse, API error)
    TransientFault(String),
}

impl<T> Attempt<T> {
    /// Classifies a provider fault
    pub fn from_error(err: &ProviderError) -> Self {
        if err.is_rate_limit() {
            Attempt::RateLimited
        } else {
            Attempt::TransientFault(err.to_string())
        }
    }
}

/// Final result of a retried operation
#[derive(Debug, PartialEq)]
pub enum RetryOutcome<T> {
    Success(T),
    Empty,
    /// Every attempt faulted
    Exhausted,
}

/// How many times to retry and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Rate-limit wait before retry `n` is `rate_limit_base * 2^(n-1)`
    pub rate_limit_base: Duration,
    /// Wait before retrying any other fault
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&MarketDataConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &MarketDataConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            rate_limit_base: config.rate_limit_backoff_base,
            transient_delay: config.transient_retry_delay,
        }
    }

    /// Wait before retry number `retry` (1-based) after a rate-limit fault
    pub fn rate_limit_delay(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.rate_limit_base.saturating_mul(factor)
    }

    /// Runs `op` until it succeeds, reports empty, or retries run out
    ///
    /// `op` receives the zero-based attempt number. `label` only feeds the
    /// log lines.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let max_attempts = self.max_retries.saturating_add(1);

        for attempt in 0..max_attempts {
            let retries_left = attempt < self.max_retries;

            let delay = match op(attempt).await {
                Attempt::Success(value) => return RetryOutcome::Success(value),
                Attempt::Empty => return RetryOutcome::Empty,
                Attempt::RateLimited => {
                    if !retries_left {
                        tracing::error!(
                            request = label,
                            attempts = max_attempts,
                            "Rate limited on every attempt, giving up"
                        );
                        return RetryOutcome::Exhausted;
                    }
                    let delay = self.rate_limit_delay(attempt + 1);
                    tracing::warn!(
                        request = label,
                        attempt = attempt + 1,
                        max_attempts,
                        wait_secs = delay.as_secs_f64(),
                        "Rate limited, backing off before retry"
                    );
                    delay
                }
                Attempt::TransientFault(error) => {
                    tracing::error!(
                        request = label,
                        attempt = attempt + 1,
                        max_attempts,
                        error = %error,
                        "Upstream request failed"
                    );
                    if !retries_left {
                        return RetryOutcome::Exhausted;
                    }
                    self.transient_delay
                }
            };

            sleep(delay).await;
        }

        RetryOutcome::Exhausted
    }
}
