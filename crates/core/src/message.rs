//! Message domain types.
//!
//! Messages are the value objects exchanged with the model gateway. They are
//! deliberately free of identifiers and timestamps: the memory-log projection
//! must be a pure function of the step sequence, so two replays of the same
//! steps produce byte-identical message lists.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (tool schemas, task framing)
    System,
    /// The task author and the loop's observations/errors
    User,
    /// The model
    Assistant,
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call (assigned by the model provider)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// A tool result carried inside a user-role message.
///
/// Providers that speak a content-block wire format (Cortex, Anthropic) render
/// this as a `tool_results` block tied to the originating call id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    /// The tool call this result answers
    pub tool_use_id: String,

    /// Name of the tool that produced the result
    pub tool_name: String,

    /// The result text
    pub text: String,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is an observation/error, the tool result it carries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResultBlock>,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result: None,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result: None,
        }
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_with_calls(
        content: impl Into<String>,
        tool_calls: Vec<MessageToolCall>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_result: None,
        }
    }

    /// Create a user-role message carrying a tool result.
    pub fn tool_result(content: impl Into<String>, block: ToolResultBlock) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result: Some(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("New task:\nBuild revenue features");
        assert_eq!(msg.role, Role::User);
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_result.is_none());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant_with_calls(
            "Running the query",
            vec![MessageToolCall {
                id: "call_1".into(),
                name: "execute_query".into(),
                arguments: serde_json::json!({"query": "SELECT 1"}),
            }],
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn identical_messages_compare_equal() {
        // No hidden ids or timestamps: construction is deterministic.
        assert_eq!(Message::user("same"), Message::user("same"));
    }
}
