use crate::breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Shared registry of named circuit breakers.
///
/// Breakers are created on first use and live for the lifetime of the
/// process. The map lock is only held for lookup and insertion, never
/// across a guarded call.
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap_or_else(|e| e.into_inner());
        breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(breaker = %name, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(name, self.config.clone()))
            })
            .clone()
    }

    /// Snapshots of every registered breaker, sorted by name.
    pub async fn all_snapshots(&self) -> Vec<BreakerSnapshot> {
        let breakers: Vec<Arc<CircuitBreaker>> = {
            let map = self.breakers.lock().unwrap_or_else(|e| e.into_inner());
            map.values().cloned().collect()
        };

        let mut snapshots = Vec::with_capacity(breakers.len());
        for breaker in breakers {
            snapshots.push(breaker.snapshot().await);
        }
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitState;

    #[tokio::test]
    async fn get_or_create_returns_same_breaker() {
        let registry = BreakerRegistry::new(BreakerConfig::default());

        let a = registry.get_or_create("agent_execution");
        let b = registry.get_or_create("agent_execution");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn snapshots_are_sorted_by_name() {
        let registry = BreakerRegistry::new(BreakerConfig::default());
        registry.get_or_create("tools");
        registry.get_or_create("agent_execution");

        let snapshots = registry.all_snapshots().await;
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].name, "agent_execution");
        assert_eq!(snapshots[1].name, "tools");
        assert_eq!(snapshots[0].state, CircuitState::Closed);
    }
}
