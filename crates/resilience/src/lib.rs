//! Resilience primitives: circuit breakers and rate-limit retry.

pub mod breaker;
pub mod registry;
pub mod retry;

pub use breaker::{
    BreakerConfig, BreakerError, BreakerSnapshot, CircuitBreaker, CircuitState,
    is_rate_limit_message,
};
pub use registry::BreakerRegistry;
pub use retry::{RetryPolicy, extract_retry_after};
