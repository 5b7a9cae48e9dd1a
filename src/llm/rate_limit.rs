//! Call spacing and retry for language model requests.
//!
//! The hosted model enforces a per-minute request quota. Rather than
//! sleeping a fixed amount after every call, [`RateLimiter`] spaces call
//! *starts* by a minimum interval, and [`RateLimitedModel`] retries
//! transient failures (429, 5xx, timeouts) with capped exponential backoff.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::LanguageModel;
use crate::config::RateLimitConfig;
use crate::error::Result;

/// Exponential backoff schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_backoff: Duration,

    /// Upper bound on any single delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_retries: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
            max_backoff,
        }
    }

    /// Never retry.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_backoff`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let delay = self.base_backoff.saturating_mul(1u32 << exponent);
        delay.min(self.max_backoff)
    }
}

impl From<&RateLimitConfig> for RetryPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.max_retries, config.base_backoff, config.max_backoff)
    }
}

/// Enforces a minimum interval between consecutive call starts.
///
/// Callers block in [`acquire`](Self::acquire) until their slot opens.
/// Concurrent callers are serialized.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter. A zero interval never blocks.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// The configured interval.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Blocks until at least `min_interval` has passed since the previous
    /// call start, then records the current instant.
    pub fn acquire(&self) {
        // A poisoned lock only means another caller panicked mid-sleep;
        // the recorded instant is still valid.
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiter waiting");
                thread::sleep(wait);
            }
        }

        *last = Some(Instant::now());
    }
}

/// Wraps a [`LanguageModel`] with call spacing and transient-error retry.
pub struct RateLimitedModel<M> {
    inner: M,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl<M: LanguageModel> RateLimitedModel<M> {
    /// Wraps `inner` using the given limits.
    pub fn new(inner: M, config: &RateLimitConfig) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(config.min_interval),
            retry: RetryPolicy::from(config),
        }
    }

    /// Returns the wrapped model.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: LanguageModel> LanguageModel for RateLimitedModel<M> {
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut retry = 0u32;
        loop {
            self.limiter.acquire();

            match self.inner.generate(prompt) {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && retry < self.retry.max_retries => {
                    retry += 1;
                    let delay = self.retry.backoff(retry);
                    warn!(
                        error = %err,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        "Language model call failed, retrying"
                    );
                    thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
