//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act on the warehouse:
//! execute a SQL query, return the final answer, etc. Each tool declares a
//! JSON-schema input description and an output type; both are rendered into
//! the system prompt and sent to the model as the active tool schema.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Name of the reserved terminal tool. Calling it ends a run.
pub const FINAL_ANSWER_TOOL: &str = "final_answer";

/// A request to execute a tool, as parsed from a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the provider's tool_use id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The observation text recorded into memory for the next model turn
    pub output: String,

    /// Optional structured data backing the observation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// If set, the loop binds `data` to this key in the run's state store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
}

impl ToolResult {
    /// A plain text observation with no state side effect.
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            data: None,
            state_key: None,
        }
    }

    /// An observation whose structured payload is bound into the state store.
    pub fn with_state(
        output: impl Into<String>,
        key: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            output: output.into(),
            data: Some(data),
            state_key: Some(key.into()),
        }
    }
}

/// The core Tool trait.
///
/// Implementations must signal bad arguments with
/// [`ToolError::InvalidArguments`] and every other failure with a different
/// variant — the agent loop relies on that distinction to choose the right
/// corrective message template.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "execute_query").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Declared output type, rendered into prompts and error messages.
    fn output_type(&self) -> &str {
        "string"
    }

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
            output_type: self.output_type().to_string(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Look up tools when the LLM requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        // Stable order so prompt rendering stays deterministic.
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
