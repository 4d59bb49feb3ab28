//! # Quarry Core
//!
//! Domain types, traits, and error definitions for the Quarry
//! feature-engineering agent.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod state;
pub mod tool;
pub mod warehouse;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, Error, ProviderError, Result, ToolError, WarehouseError};
pub use message::{Message, MessageToolCall, Role, ToolResultBlock};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use state::StateStore;
pub use tool::{FINAL_ANSWER_TOOL, Tool, ToolCall, ToolRegistry, ToolResult};
pub use warehouse::{QueryExecutor, QueryResult};
