/**
 * Fallback Policy
 *
 * Every call to an external moderation service goes through a
 * [`FallbackPolicy`]: the call is bounded by a timeout, transient failures are
 * retried with backoff, and when the call still fails the caller's fallback
 * value is returned instead of an error. Tiers 2 and 3 use this to fail open.
 *
 * # Retry Rules
 *
 * Only transient failures (timeouts, transport errors, 5xx) are retried.
 * Rate limiting and other 4xx responses fall back immediately, since
 * repeating them only adds load on an upstream that already refused.
 */

use std::future::Future;
use std::time::Duration;

use super::error::ServiceError;
use crate::shared::config::DEFAULT_SERVICE_TIMEOUT;

/// Delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately
    None,
    /// Same delay before every retry
    Fixed(Duration),
    /// `base * 2^(retry-1)`, capped at `max`
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay before retry number `retry` (1-based)
    pub fn delay(&self, retry: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                base.saturating_mul(factor).min(*max)
            }
        }
    }
}

/// Outcome of a guarded call
#[derive(Debug)]
pub enum Guarded<T> {
    /// The service answered
    Completed(T),
    /// The service failed and the fallback value was used
    FellBack { value: T, error: ServiceError },
}

impl<T> Guarded<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Guarded::FellBack { .. })
    }

    pub fn into_value(self) -> T {
        match self {
            Guarded::Completed(value) => value,
            Guarded::FellBack { value, .. } => value,
        }
    }
}

/// Timeout, retry and fallback settings shared by external service calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub timeout: Duration,
    pub retries: u32,
    pub backoff: Backoff,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SERVICE_TIMEOUT,
            retries: 1,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(200),
                max: Duration::from_secs(2),
            },
        }
    }
}

impl FallbackPolicy {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run `call` under this policy, returning `fallback` if it never succeeds.
    ///
    /// `operation` names the call in log output.
    pub async fn run<T, F, Fut>(&self, operation: &str, fallback: T, mut call: F) -> Guarded<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut retry = 0;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(value) => return Guarded::Completed(value),
                Err(error) if error.is_transient() && retry < self.retries => {
                    retry += 1;
                    let delay = self.backoff.delay(retry);
                    tracing::debug!(operation, %error, retry, ?delay, "Retrying external call");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        operation,
                        %error,
                        attempts = retry + 1,
                        "External call failed, using fallback"
                    );
                    return Guarded::FellBack {
                        value: fallback,
                        error,
                    };
                }
            }
        }
    }
}
