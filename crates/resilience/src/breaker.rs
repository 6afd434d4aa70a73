//! Circuit breaker for agent execution.
//!
//! CLOSED passes calls through and decays the failure count by one on
//! each success, so a burst of failures is forgiven gradually, not reset
//! wholesale. OPEN rejects immediately until the recovery timeout has
//! elapsed, at which point the next caller (lazily, with no background
//! timer) flips the breaker to HALF_OPEN as a probe. Enough
//! consecutive probe successes close it; any probe failure re-opens.
//!
//! Rate-limit errors pass through without touching the failure count:
//! a throttled upstream is busy, not broken.

use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Failures before the breaker opens
    pub failure_threshold: u32,
    /// How long OPEN lasts before a half-open probe is allowed
    pub recovery_timeout: Duration,
    /// Consecutive half-open successes needed to close
    pub success_threshold: u32,
    /// Maximum execution time for a guarded call
    pub call_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
            call_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct BreakerStats {
    state: CircuitState,
    failure_count: u32,
    success_count: u64,
    consecutive_successes: u32,
    last_failure_at: Option<Instant>,
}

impl Default for BreakerStats {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            consecutive_successes: 0,
            last_failure_at: None,
        }
    }
}

/// A read-only view of breaker state, for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u64,
    pub consecutive_successes: u32,
    /// Seconds since the last recorded failure, if any
    pub seconds_since_last_failure: Option<f64>,
}

/// Errors surfaced by a guarded call.
#[derive(Debug, Error)]
pub enum BreakerError<E: std::fmt::Display + std::fmt::Debug> {
    #[error("circuit breaker '{name}' is open")]
    Open { name: String },

    #[error("execution timed out in '{name}' after {timeout_secs}s")]
    Timeout { name: String, timeout_secs: u64 },

    #[error("rate limited in '{name}': {inner}")]
    RateLimited { name: String, inner: E },

    #[error("execution failed in '{name}': {inner}")]
    Failed { name: String, inner: E },
}

/// Classify an error message as a rate-limit signal.
///
/// Matches what upstream providers actually say: an HTTP 429 code, the
/// phrase "rate limit" (which also covers "rate limited"), or a quota
/// exhaustion message.
pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429") || lower.contains("rate limit") || lower.contains("quota")
}

/// A named circuit breaker guarding one downstream dependency.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    stats: Mutex<BreakerStats>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            stats: Mutex::new(BreakerStats::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a call under the breaker with the configured timeout.
    pub async fn call<T, E, Fut>(&self, fut: Fut) -> Result<T, BreakerError<E>>
    where
        E: std::fmt::Display + std::fmt::Debug,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_with_timeout(self.config.call_timeout, fut).await
    }

    /// Run a call under the breaker with an explicit timeout (used when
    /// a route plan carries a tighter budget than the breaker default).
    pub async fn call_with_timeout<T, E, Fut>(
        &self,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, BreakerError<E>>
    where
        E: std::fmt::Display + std::fmt::Debug,
        Fut: Future<Output = Result<T, E>>,
    {
        {
            let mut stats = self.stats.lock().await;
            if stats.state == CircuitState::Open {
                if self.should_attempt_reset(&stats) {
                    info!(breaker = %self.name, "Circuit breaker attempting half-open probe");
                    stats.state = CircuitState::HalfOpen;
                } else {
                    warn!(breaker = %self.name, "Circuit breaker is open, rejecting call");
                    return Err(BreakerError::Open {
                        name: self.name.clone(),
                    });
                }
            }
        }

        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(value)) => {
                self.record_success().await;
                Ok(value)
            }
            Ok(Err(e)) => {
                if is_rate_limit_message(&e.to_string()) {
                    warn!(breaker = %self.name, error = %e, "Rate limited, not counted as failure");
                    Err(BreakerError::RateLimited {
                        name: self.name.clone(),
                        inner: e,
                    })
                } else {
                    self.record_failure().await;
                    error!(breaker = %self.name, error = %e, "Guarded execution failed");
                    Err(BreakerError::Failed {
                        name: self.name.clone(),
                        inner: e,
                    })
                }
            }
            Err(_) => {
                self.record_failure().await;
                error!(breaker = %self.name, timeout_secs = timeout.as_secs(), "Guarded execution timed out");
                Err(BreakerError::Timeout {
                    name: self.name.clone(),
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
    }

    async fn record_success(&self) {
        let mut stats = self.stats.lock().await;
        stats.success_count += 1;

        match stats.state {
            CircuitState::HalfOpen => {
                stats.consecutive_successes += 1;
                if stats.consecutive_successes >= self.config.success_threshold {
                    info!(breaker = %self.name, "Circuit breaker closing, service recovered");
                    stats.state = CircuitState::Closed;
                    stats.failure_count = 0;
                    stats.consecutive_successes = 0;
                }
            }
            CircuitState::Closed => {
                // Decay, not reset: one success forgives one failure.
                stats.failure_count = stats.failure_count.saturating_sub(1);
            }
            CircuitState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let mut stats = self.stats.lock().await;
        stats.failure_count += 1;
        stats.last_failure_at = Some(Instant::now());
        stats.consecutive_successes = 0;

        match stats.state {
            CircuitState::Closed if stats.failure_count >= self.config.failure_threshold => {
                warn!(breaker = %self.name, failures = stats.failure_count, "Circuit breaker opening");
                stats.state = CircuitState::Open;
            }
            CircuitState::HalfOpen => {
                warn!(breaker = %self.name, "Circuit breaker re-opening, half-open probe failed");
                stats.state = CircuitState::Open;
            }
            _ => {}
        }
    }

    fn should_attempt_reset(&self, stats: &BreakerStats) -> bool {
        match stats.last_failure_at {
            Some(at) => at.elapsed() >= self.config.recovery_timeout,
            None => true,
        }
    }

    /// A point-in-time view of the breaker.
    pub async fn snapshot(&self) -> BreakerSnapshot {
        let stats = self.stats.lock().await;
        BreakerSnapshot {
            name: self.name.clone(),
            state: stats.state,
            failure_count: stats.failure_count,
            success_count: stats.success_count,
            consecutive_successes: stats.consecutive_successes,
            seconds_since_last_failure: stats.last_failure_at.map(|at| at.elapsed().as_secs_f64()),
        }
    }
}
