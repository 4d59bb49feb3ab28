//! The memory log and its projection into messages.
//!
//! Projection rules (fixed order, empties omitted):
//! - system prompt first
//! - `TaskStep` → one user message announcing the new task
//! - `ActionStep` → the assistant's output (with its tool call), then a
//!   user-role observation, then a user-role error
//!
//! The projection reads nothing but the step sequence and the given system
//! prompt, so replaying the same log twice yields identical messages.

use quarry_core::message::{Message, MessageToolCall, ToolResultBlock};

use crate::step::{ActionStep, Step, TaskStep};

/// Coaching suffix appended to every error shown to the model.
const RETRY_HINT: &str = "\nNow let's retry: take care not to repeat previous errors! \
If you have retried several times, try a completely different approach.\n";

/// Ordered, append-only record of a run's steps.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLog {
    steps: Vec<Step>,
}

impl MemoryLog {
    /// Create a log holding only the task step.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            steps: vec![Step::Task(TaskStep::new(task))],
        }
    }

    /// Append a finished action step. Steps are never mutated afterwards.
    pub fn push(&mut self, step: ActionStep) {
        self.steps.push(Step::Action(step));
    }

    /// The recorded steps, in insertion order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The task text this run was started with.
    pub fn task(&self) -> &str {
        match &self.steps[0] {
            Step::Task(t) => &t.task,
            // new() always puts the task first
            Step::Action(_) => "",
        }
    }

    /// Number of action steps recorded so far.
    pub fn action_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Action(_)))
            .count()
    }

    /// Project the log into the message sequence for the next model call.
    pub fn to_messages(&self, system_prompt: &str) -> Vec<Message> {
        let mut messages = vec![Message::system(system_prompt)];

        for step in &self.steps {
            match step {
                Step::Task(task) => {
                    messages.push(Message::user(format!("New task:\n{}", task.task)));
                }
                Step::Action(action) => {
                    messages.extend(action_step_to_messages(action));
                }
            }
        }

        messages
    }
}

/// Project one action step into zero to three messages.
fn action_step_to_messages(step: &ActionStep) -> Vec<Message> {
    let mut messages = Vec::new();

    if let Some(output) = &step.model_output {
        let calls = step
            .tool_call
            .iter()
            .map(|call| MessageToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            })
            .collect();
        messages.push(Message::assistant_with_calls(output.clone(), calls));
    }

    if let Some(observation) = &step.observation {
        messages.push(match &step.tool_call {
            Some(call) => Message::tool_result(
                observation.clone(),
                ToolResultBlock {
                    tool_use_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    text: observation.clone(),
                },
            ),
            None => Message::user(observation.clone()),
        });
    }

    if let Some(error) = &step.error {
        let error_text = format!("Error:\n{error}{RETRY_HINT}");
        messages.push(match &step.tool_call {
            Some(call) => Message::tool_result(
                format!("Call id: {}\n{error_text}", call.id),
                ToolResultBlock {
                    tool_use_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    text: error_text,
                },
            ),
            None => Message::user(error_text),
        });
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::message::Role;
    use quarry_core::tool::ToolCall;
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "execute_query".into(),
            arguments: json!({"query": "SELECT 1"}),
        }
    }

    fn observed_step(n: usize) -> ActionStep {
        let mut step = ActionStep::new(n);
        step.model_output = Some("I'll run the query.".into());
        step.tool_call = Some(call("call_1"));
        step.observation = Some("Query returned 1 rows".into());
        step
    }

    #[test]
    fn projection_order_and_roles() {
        let mut log = MemoryLog::new("Build revenue features");
        log.push(observed_step(1));

        let messages = log.to_messages("You are a SQL agent.");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.starts_with("New task:\n"));
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].tool_calls.len(), 1);
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(
            messages[3].tool_result.as_ref().unwrap().tool_use_id,
            "call_1"
        );
    }

    #[test]
    fn projection_is_deterministic() {
        let mut log = MemoryLog::new("task");
        log.push(observed_step(1));
        let mut errored = ActionStep::new(2);
        errored.model_output = Some("Trying again".into());
        errored.tool_call = Some(call("call_2"));
        errored.error = Some("Invalid call to tool 'execute_query'".into());
        log.push(errored);

        let first = log.to_messages("prompt");
        let second = log.to_messages("prompt");
        assert_eq!(first, second);
    }

    #[test]
    fn error_message_carries_call_id_and_retry_hint() {
        let mut log = MemoryLog::new("task");
        let mut step = ActionStep::new(1);
        step.model_output = Some("".into());
        step.tool_call = Some(call("call_9"));
        step.error = Some("boom".into());
        log.push(step);

        let messages = log.to_messages("prompt");
        let error_msg = messages.last().unwrap();
        assert_eq!(error_msg.role, Role::User);
        assert!(error_msg.content.contains("Call id: call_9"));
        assert!(error_msg.content.contains("Error:\nboom"));
        assert!(error_msg.content.contains("Now let's retry"));
    }

    #[test]
    fn empty_fields_are_omitted() {
        let mut log = MemoryLog::new("task");
        // Step with only model output: no observation or error messages.
        let mut step = ActionStep::new(1);
        step.model_output = Some("thinking".into());
        log.push(step);

        let messages = log.to_messages("prompt");
        // system, task, assistant — nothing else
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::Assistant);
    }

    #[test]
    fn task_is_preserved() {
        let log = MemoryLog::new("Extend daily_revenue");
        assert_eq!(log.task(), "Extend daily_revenue");
        assert_eq!(log.action_count(), 0);
    }
}
