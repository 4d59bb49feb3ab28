//! Error types for the Quarry domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Errors split into two propagation classes: contract breaches between the
//! loop and the model ([`AgentError`]) terminate a run; tool-level failures
//! ([`ToolError`]) are translated into corrective observations so the next
//! model turn can self-correct.

use thiserror::Error;

/// The top-level error type for all Quarry operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Agent loop errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Provider (model gateway) errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Warehouse errors ---
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    // --- Semantic model file errors ---
    #[error("Semantic model error: {0}")]
    Semantic(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Run-terminating failures of the loop ↔ model contract.
///
/// Both variants abort the run and propagate to the caller. Recoverable
/// mistakes (bad arguments, tool body failures) never become an `AgentError`;
/// they are written into the memory log as the step's error instead.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model response was malformed or carried no tool call at all.
    #[error("Error while generating or parsing model output: {0}")]
    Parsing(String),

    /// The model named a tool that exists in neither the tool registry nor
    /// the managed-agent set.
    #[error("Unknown tool '{name}', should be one of: {}", .available.join(", "))]
    UnknownTool {
        name: String,
        available: Vec<String>,
    },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Tool invocation failures.
///
/// `InvalidArguments` is deliberately distinct from every other variant: the
/// agent loop matches on it to decide whether the corrective message should
/// echo the tool's expected schema back to the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed in '{tool_name}': {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum WarehouseError {
    #[error("Warehouse API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Malformed warehouse response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_enumerates_valid_set() {
        let err = AgentError::UnknownTool {
            name: "foo".into(),
            available: vec!["bar".into(), "baz".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'foo'"));
        assert!(msg.contains("bar, baz"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "execute_query".into(),
            reason: "table not found".into(),
        });
        assert!(err.to_string().contains("execute_query"));
        assert!(err.to_string().contains("table not found"));
    }

    #[test]
    fn warehouse_error_displays_correctly() {
        let err = Error::Warehouse(WarehouseError::ApiError {
            status_code: 422,
            message: "syntax error at line 1".into(),
        });
        assert!(err.to_string().contains("422"));
        assert!(err.to_string().contains("syntax error"));
    }
}
