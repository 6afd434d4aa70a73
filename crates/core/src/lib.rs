//! # Agentgate Core
//!
//! Domain types, traits, and error definitions for the Agentgate
//! query-routing service. This crate has **zero framework dependencies**:
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod catalog;
pub mod agent;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, MessageToolCall, Role, Conversation};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use catalog::{RemoteTool, ToolCall, ToolCatalog, ToolDescriptor};
pub use agent::{AgentCatalog, AgentDescriptor, UNRANKED_PRIORITY};
