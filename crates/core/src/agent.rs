//! Agent descriptors and the agent catalog.
//!
//! Agents here are routing targets, not running processes: a named
//! persona bound to a family of tools, with a priority used when
//! conflicting agents compete for the same query.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Priority assigned to agents that never declared one.
/// Sorts after every configured agent.
pub const UNRANKED_PRIORITY: u32 = 99;

/// Static metadata about a selectable agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique agent name (e.g., "github_security_agent")
    pub name: String,

    /// Human-readable description of the agent's specialty
    #[serde(default)]
    pub description: String,

    /// Selection priority; lower wins when agents conflict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl AgentDescriptor {
    /// The effective priority, falling back to [`UNRANKED_PRIORITY`].
    pub fn effective_priority(&self) -> u32 {
        self.priority.unwrap_or(UNRANKED_PRIORITY)
    }
}

/// The ordered set of agents known to the service.
///
/// Built once from configuration at startup, then only read.
#[derive(Debug, Clone, Default)]
pub struct AgentCatalog {
    agents: Vec<AgentDescriptor>,
    by_name: HashMap<String, usize>,
}

impl AgentCatalog {
    pub fn new(agents: Vec<AgentDescriptor>) -> Self {
        let by_name = agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();
        Self { agents, by_name }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&AgentDescriptor> {
        self.by_name.get(name).map(|&i| &self.agents[i])
    }

    /// Effective priority for an agent name; unknown names sort last.
    pub fn priority_of(&self, name: &str) -> u32 {
        self.get(name)
            .map(|a| a.effective_priority())
            .unwrap_or(UNRANKED_PRIORITY)
    }

    /// All agents in configuration order.
    pub fn all(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    /// Names in configuration order.
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    /// The first configured agent, if any. Used as the fallback target
    /// when routing cannot pick anything better.
    pub fn first(&self) -> Option<&AgentDescriptor> {
        self.agents.first()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
