//! Run configuration and outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generation and budget parameters for one agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model name passed to the provider
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Max tokens per model response
    pub max_tokens: Option<u32>,

    /// Maximum number of action steps before the run is cut off
    pub max_steps: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet".into(),
            temperature: 0.7,
            max_tokens: Some(4096),
            max_steps: 8,
        }
    }
}

/// How a run ended.
///
/// Exhausting the step budget is a normal outcome, not an error: the caller
/// gets `Incomplete` and decides what to do with the partial run. Contract
/// breaches (parsing failures, unknown tools) surface as errors instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The model called `final_answer`; carries the resolved answer value.
    Completed { answer: Value, steps: usize },

    /// The step budget ran out before a final answer.
    Incomplete { steps: usize },
}

impl RunOutcome {
    /// The answer, if the run completed.
    pub fn answer(&self) -> Option<&Value> {
        match self {
            RunOutcome::Completed { answer, .. } => Some(answer),
            RunOutcome::Incomplete { .. } => None,
        }
    }

    /// The answer rendered as text, if the run completed.
    pub fn answer_text(&self) -> Option<String> {
        self.answer().map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}
