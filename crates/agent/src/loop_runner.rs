//! The agent loop state machine.
//!
//! One run walks: project memory into messages, call the model, take exactly
//! one tool call from the reply, resolve state variables in its arguments,
//! dispatch, record the observation or error, repeat. Two failure classes are
//! kept strictly apart:
//!
//! - contract breaches (malformed model output, zero tool calls, unknown tool
//!   names) abort the run and surface as [`AgentError`];
//! - recoverable mistakes (bad arguments, tool body failures) become the
//!   step's error text in memory so the next model turn can self-correct.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, info, warn};

use quarry_core::error::{AgentError, Error, Result, ToolError};
use quarry_core::provider::{Provider, ProviderRequest, ToolDefinition};
use quarry_core::state::StateStore;
use quarry_core::tool::{FINAL_ANSWER_TOOL, Tool, ToolCall, ToolRegistry};
use quarry_memory::{ActionStep, MemoryLog};

use crate::prompt::render_system_prompt;
use crate::result::{RunConfig, RunOutcome};

/// A nested agent exposed to a parent loop through the tool namespace.
///
/// Called like a tool with a single `task` argument; the call runs the inner
/// agent to completion and the sub-run's answer becomes the observation.
pub struct ManagedAgent {
    name: String,
    description: String,
    agent: AgentLoop,
}

impl ManagedAgent {
    pub fn new(name: impl Into<String>, description: impl Into<String>, agent: AgentLoop) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "task": {
                        "type": "string",
                        "description": "The task to delegate to this team member"
                    }
                },
                "required": ["task"]
            }),
            output_type: "string".into(),
        }
    }

    /// Pull the task text out of the call arguments.
    fn task_from_arguments(arguments: &Value) -> Option<String> {
        match arguments {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("task").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }
    }
}

/// The agent loop: an immutable bundle of provider, tools, and run settings.
/// Per-run state (memory log, state store) is created inside [`run`] so
/// concurrent runs never share it.
///
/// [`run`]: AgentLoop::run
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    managed_agents: BTreeMap<String, ManagedAgent>,
    config: RunConfig,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            managed_agents: BTreeMap::new(),
            config: RunConfig::default(),
        }
    }

    /// Replace the run configuration.
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of action steps per run.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = max_steps;
        self
    }

    /// Attach a nested agent, callable by name like a tool.
    pub fn with_managed_agent(mut self, agent: ManagedAgent) -> Self {
        self.managed_agents.insert(agent.name.clone(), agent);
        self
    }

    /// All names the model may call: tools plus team members, sorted.
    fn callable_names(&self) -> Vec<String> {
        let mut names = self.tools.names();
        names.extend(self.managed_agents.keys().cloned());
        names.sort();
        names
    }

    /// Tool schema sent with every model call.
    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs = self.tools.definitions();
        defs.extend(self.managed_agents.values().map(ManagedAgent::definition));
        defs
    }

    /// Run the loop on a task until a final answer, a fatal error, or the
    /// step budget. Boxed so managed agents can recurse through it.
    pub fn run<'a>(&'a self, task: &'a str) -> BoxFuture<'a, Result<RunOutcome>> {
        Box::pin(self.run_inner(task))
    }

    async fn run_inner(&self, task: &str) -> Result<RunOutcome> {
        info!(task = %task, max_steps = self.config.max_steps, "Starting agent run");

        let mut memory = MemoryLog::new(task);
        let mut state = StateStore::new();

        let managed_summaries: Vec<(String, String)> = self
            .managed_agents
            .values()
            .map(|m| (m.name.clone(), m.description.clone()))
            .collect();
        let definitions = self.definitions();
        let system_prompt = render_system_prompt(&definitions, &managed_summaries);

        for step_number in 1..=self.config.max_steps {
            let mut step = ActionStep::new(step_number);
            debug!(step = step_number, "Agent loop step");

            let messages = memory.to_messages(&system_prompt);
            step.model_input_messages = messages.clone();

            let request = ProviderRequest {
                model: self.config.model.clone(),
                messages,
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
                tools: definitions.clone(),
                stop: vec!["Observation:".into(), "Calling tools:".into()],
            };

            // Any gateway failure is a parsing error: the model/loop contract
            // is broken and the run aborts rather than retrying here.
            let response = self
                .provider
                .complete(request)
                .await
                .map_err(|e| AgentError::Parsing(e.to_string()))?;

            step.model_output = Some(response.message.content.clone());

            let mut calls = response.message.tool_calls;
            if calls.is_empty() {
                return Err(AgentError::Parsing(
                    "Model did not call any tools. Call `final_answer` tool to return a final answer."
                        .into(),
                )
                .into());
            }
            if calls.len() > 1 {
                warn!(
                    dropped = calls.len() - 1,
                    "Model returned multiple tool calls; keeping only the first"
                );
            }
            let chosen = calls.swap_remove(0);
            let call = ToolCall {
                id: chosen.id,
                name: chosen.name,
                arguments: chosen.arguments,
            };
            step.tool_call = Some(call.clone());

            info!(step = step_number, tool = %call.name, "Calling tool");

            if call.name == FINAL_ANSWER_TOOL {
                let answer = Self::resolve_final_answer(&call.arguments, &state);
                step.final_answer = Some(answer.clone());
                step.finish();
                memory.push(step);
                info!(steps = step_number, "Run completed with final answer");
                return Ok(RunOutcome::Completed {
                    answer,
                    steps: step_number,
                });
            }

            match self.dispatch(&call, &state).await {
                Ok(DispatchOutcome::Tool(result)) => {
                    if let (Some(key), Some(data)) = (&result.state_key, &result.data) {
                        state.insert(key.clone(), data.clone());
                    }
                    step.observation = Some(result.output);
                }
                Ok(DispatchOutcome::Managed(text)) => {
                    step.observation = Some(text);
                }
                Err(StepError::Fatal(error)) => return Err(error),
                Err(StepError::Recoverable(message)) => {
                    warn!(step = step_number, tool = %call.name, "Step failed recoverably");
                    step.error = Some(message);
                }
            }

            step.finish();
            memory.push(step);
        }

        info!(steps = self.config.max_steps, "Step budget exhausted without a final answer");
        Ok(RunOutcome::Incomplete {
            steps: self.config.max_steps,
        })
    }

    /// Resolve the `final_answer` argument, applying state indirection when
    /// the answer is a string that exactly names a state key.
    fn resolve_final_answer(arguments: &Value, state: &StateStore) -> Value {
        let answer = match arguments {
            Value::Object(map) => map.get("answer").cloned().unwrap_or_else(|| arguments.clone()),
            other => other.clone(),
        };

        if let Value::String(key) = &answer {
            if state.contains_key(key) {
                info!(key = %key, "Final answer names a state variable; returning the stored value");
                return state.get(key).cloned().unwrap_or(answer);
            }
        }
        answer
    }

    /// Dispatch a non-final tool call to a tool or managed agent.
    async fn dispatch(
        &self,
        call: &ToolCall,
        state: &StateStore,
    ) -> std::result::Result<DispatchOutcome, StepError> {
        let arguments = state.substitute_arguments(&call.arguments);

        if let Some(tool) = self.tools.get(&call.name) {
            return match tool.execute(arguments.clone()).await {
                Ok(result) => Ok(DispatchOutcome::Tool(result)),
                Err(ToolError::InvalidArguments(e)) => {
                    Err(StepError::Recoverable(argument_error_message(
                        tool, &arguments, &e,
                    )))
                }
                Err(e) => Err(StepError::Recoverable(format!(
                    "Error executing tool '{}' with arguments {}: {}\n\
                     Please try again or use another tool",
                    call.name, arguments, e
                ))),
            };
        }

        if let Some(managed) = self.managed_agents.get(&call.name) {
            let Some(task) = ManagedAgent::task_from_arguments(&arguments) else {
                return Err(StepError::Recoverable(format!(
                    "Invalid request to team member '{}' with arguments {}: expected a 'task' string\n\
                     You should call this team member with a valid request.\n\
                     Team member description: {}",
                    call.name, arguments, managed.description
                )));
            };

            return match managed.agent.run(&task).await {
                Ok(RunOutcome::Completed { answer, .. }) => {
                    Ok(DispatchOutcome::Managed(match answer {
                        Value::String(s) => s,
                        other => other.to_string(),
                    }))
                }
                Ok(RunOutcome::Incomplete { steps }) => Err(StepError::Recoverable(format!(
                    "Error executing request to team member '{}' with arguments {}: \
                     no final answer within {} steps\n\
                     Please try again or request to another team member",
                    call.name, arguments, steps
                ))),
                Err(e) => Err(StepError::Recoverable(format!(
                    "Error executing request to team member '{}' with arguments {}: {}\n\
                     Please try again or request to another team member",
                    call.name, arguments, e
                ))),
            };
        }

        Err(StepError::Fatal(
            AgentError::UnknownTool {
                name: call.name.clone(),
                available: self.callable_names(),
            }
            .into(),
        ))
    }
}

/// Corrective message for bad arguments: echoes the expected schema so the
/// next model turn can fix the call.
fn argument_error_message(tool: &dyn Tool, arguments: &Value, error: &str) -> String {
    format!(
        "Invalid call to tool '{}' with arguments {}: {}\n\
         You should call this tool with correct input arguments.\n\
         Expected inputs: {}\n\
         Returns output type: {}\n\
         Tool description: '{}'",
        tool.name(),
        arguments,
        error,
        tool.parameters_schema(),
        tool.output_type(),
        tool.description()
    )
}

enum DispatchOutcome {
    Tool(quarry_core::tool::ToolResult),
    Managed(String),
}

enum StepError {
    /// Contract breach: abort the run.
    Fatal(Error),
    /// Step-local failure: recorded into memory, run continues.
    Recoverable(String),
}
