//! # Agentgate Routing
//!
//! Turns a raw query plus the tool catalog into an executable plan:
//! which agents, which tool subset, and how aggressively to run.
//!
//! Pipeline order: dispatch patterns first (fast path), then keyword
//! agent scoring plus relevance filtering (fallback path), then agent
//! conflict resolution. The stages are independent; the selector can
//! be used on a caller-supplied agent list without routing a query.

pub mod pattern;
pub mod relevance;
pub mod router;
pub mod selector;

pub use pattern::{CompiledRule, PatternSet};
pub use relevance::filter_by_relevance;
pub use router::{QueryRouter, RoutePlan, SpeedConfig};
pub use selector::{AgentSelector, SelectionResult};
