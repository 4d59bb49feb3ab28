//! Built-in tools for Quarry agents.
//!
//! Two tools ship with the runtime: `execute_query`, which runs SQL against
//! the warehouse and binds the result set into the run's state store, and the
//! reserved `final_answer` tool that terminates a run.

pub mod execute_query;
pub mod final_answer;

pub use execute_query::ExecuteQueryTool;
pub use final_answer::FinalAnswerTool;
