//! Step record types.
//!
//! A [`TaskStep`] is created once per run and never changes. An
//! [`ActionStep`] is created at the start of each loop iteration,
//! progressively filled while the step executes, and frozen once it is pushed
//! into the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quarry_core::message::Message;
use quarry_core::tool::ToolCall;

/// The original user task. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStep {
    pub task: String,
}

impl TaskStep {
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into() }
    }
}

/// One loop iteration: what was sent, what came back, what was done with it.
///
/// At most one tool call per step — the field is an `Option`, not a `Vec`,
/// so the invariant is carried by the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    /// 1-based step number within the run
    pub step_number: usize,

    /// When the step started
    pub started_at: DateTime<Utc>,

    /// When the step ended (set just before the step is pushed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// The full message list sent to the model for this step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub model_input_messages: Vec<Message>,

    /// The assistant's free-text output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_output: Option<String>,

    /// The single tool call chosen for this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,

    /// The tool's observation, if the invocation succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,

    /// The step's error, if the invocation failed recoverably
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The resolved final answer, if this was the terminal step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<serde_json::Value>,
}

impl ActionStep {
    /// Start a new step record.
    pub fn new(step_number: usize) -> Self {
        Self {
            step_number,
            started_at: Utc::now(),
            ended_at: None,
            model_input_messages: Vec::new(),
            model_output: None,
            tool_call: None,
            observation: None,
            error: None,
            final_answer: None,
        }
    }

    /// Mark the step as finished.
    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
    }
}

/// A single entry in the memory log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Task(TaskStep),
    Action(ActionStep),
}
