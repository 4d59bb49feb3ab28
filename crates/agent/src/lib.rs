//! The Quarry agent reasoning loop.
//!
//! A run drives steps until the model calls the reserved `final_answer` tool,
//! a contract breach aborts it, or the step budget runs out. Each step is one
//! model call followed by exactly one tool invocation; the full memory log is
//! re-projected into messages at every step, so memory is always the source
//! of truth for the conversation.

pub mod loop_runner;
pub mod prompt;
pub mod result;

pub use loop_runner::{AgentLoop, ManagedAgent};
pub use result::{RunConfig, RunOutcome};
