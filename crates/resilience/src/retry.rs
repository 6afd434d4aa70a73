//! Rate-limit retry with spacing and backoff.
//!
//! Providers signal throttling either structurally (a 429 with a
//! retry-after) or as free text in an error message; this module
//! honors the provider's suggested wait when one can be extracted and
//! falls back to exponential backoff otherwise. Calls through one
//! policy are also spaced a minimum interval apart.

use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

fn retry_after_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)retry after (\d+)").expect("retry-after regex is valid"))
}

/// Pull a provider-suggested wait out of an error message, e.g.
/// "Rate limited by provider, retry after 5 seconds".
pub fn extract_retry_after(message: &str) -> Option<Duration> {
    let captures = retry_after_regex().captures(message)?;
    let secs: u64 = captures.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_secs(secs))
}

/// Retry policy for rate-limited calls.
///
/// Only rate-limit errors are retried; anything else fails on the
/// first attempt. Between attempts the policy waits the provider's
/// suggested retry-after when the message carries one, otherwise
/// exponential backoff from the base delay. All calls through one
/// policy are additionally spaced at least `min_spacing` apart, which
/// keeps a burst of independent requests from re-triggering the limit.
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    min_spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, min_spacing: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            min_spacing,
            last_call: Mutex::new(None),
        }
    }

    /// Run `op`, retrying on rate-limit errors up to `max_retries`
    /// times. The error's `Display` output decides whether it is a
    /// rate limit and whether it carries a retry-after hint.
    pub async fn call<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        for attempt in 0..=self.max_retries {
            self.wait_for_spacing().await;

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let message = e.to_string();
                    if !crate::breaker::is_rate_limit_message(&message) {
                        return Err(e);
                    }
                    if attempt == self.max_retries {
                        warn!(attempts = attempt + 1, "Rate limit retries exhausted");
                        return Err(e);
                    }

                    let delay = extract_retry_after(&message)
                        .unwrap_or_else(|| backoff_delay(self.base_delay, attempt));
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
        unreachable!("loop always returns")
    }

    /// Enforce minimum spacing between calls. The lock is held across
    /// the sleep so concurrent callers queue rather than stampede.
    async fn wait_for_spacing(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.min_spacing {
                let wait = self.min_spacing - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Spacing out call");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Exponential backoff delay for an attempt, saturating instead of
/// overflowing when a config allows a very high retry count.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
